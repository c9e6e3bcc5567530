use std::path::PathBuf;

use landscape_core::LandscapeError;
use landscape_stats::StatsError;

/// Errors that can occur while locating stars and scanning for satellites.
#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error(transparent)]
    Landscape(#[from] LandscapeError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("checkpoint {path} belongs to a different run ({found}, expected {expected})")]
    CheckpointMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadarError {
    /// Configuration errors are reported before any long computation starts.
    pub fn is_config_error(&self) -> bool {
        match self {
            RadarError::Landscape(e) => e.is_input_domain(),
            RadarError::Stats(e) => !matches!(e, StatsError::NoStars),
            RadarError::Config(_) | RadarError::CheckpointMismatch { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RadarError>;
