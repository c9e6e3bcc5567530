/// Errors raised while reducing a run or a catalog to statistics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("no complete stars to aggregate")]
    NoStars,

    #[error("scan radius must be >= 2, got {0}")]
    RadiusTooSmall(u64),

    #[error("gap k={k} lies outside the scan window (R={radius})")]
    GapOutOfWindow { k: u64, radius: u64 },

    #[error("invalid model parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;
