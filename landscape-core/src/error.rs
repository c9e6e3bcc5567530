use thiserror::Error;

/// Errors raised by the oracle, the candidate family and input validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandscapeError {
    #[error("index n must be >= 1, got {0}")]
    IndexOutOfDomain(String),

    #[error("scan radius must be >= 2, got {0}")]
    RadiusTooSmall(u64),

    #[error("empty index range [{lo}, {hi})")]
    EmptyRange { lo: String, hi: String },

    #[error("index list is empty")]
    EmptyList,

    #[error("family exponent must be >= 2, got {0}")]
    InvalidExponent(u32),

    #[error("primality oracle inconclusive for a {digits}-digit candidate")]
    OracleInconclusive { digits: usize },
}

impl LandscapeError {
    /// True for errors caused by bad configuration rather than by the data.
    pub fn is_input_domain(&self) -> bool {
        !matches!(self, LandscapeError::OracleInconclusive { .. })
    }
}

pub type Result<T> = std::result::Result<T, LandscapeError>;
