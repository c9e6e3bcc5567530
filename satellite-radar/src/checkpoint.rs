//! JSON checkpoints of completed stars, so interrupted runs can resume.

use std::path::Path;

use serde::{Deserialize, Serialize};

use landscape_core::StarRecord;

use crate::error::{RadarError, Result};
use crate::locator::UndecidedIndex;

/// Progress of a run: how many indices (in source order) are fully processed
/// and the records of the stars among them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub fingerprint: String,
    pub processed: usize,
    pub records: Vec<StarRecord>,
    #[serde(default)]
    pub undecided: Vec<UndecidedIndex>,
}

impl Checkpoint {
    pub fn new(fingerprint: String) -> Self {
        Self {
            fingerprint,
            processed: 0,
            records: Vec::new(),
            undecided: Vec::new(),
        }
    }

    /// Load the checkpoint at `path` if it exists and belongs to this run.
    ///
    /// A missing file starts a fresh run. An unreadable file is logged and
    /// ignored; a file from another run is an error so it is never overwritten.
    pub fn load_or_new(path: &Path, fingerprint: &str) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(fingerprint.to_string()));
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Failed to read {}: {}, starting over", path.display(), e);
                return Ok(Self::new(fingerprint.to_string()));
            }
        };

        let checkpoint: Checkpoint = match serde_json::from_str(&contents) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                log::warn!("Failed to parse {}: {}, starting over", path.display(), e);
                return Ok(Self::new(fingerprint.to_string()));
            }
        };

        if checkpoint.fingerprint != fingerprint {
            return Err(RadarError::CheckpointMismatch {
                path: path.to_path_buf(),
                expected: fingerprint.to_string(),
                found: checkpoint.fingerprint,
            });
        }

        log::info!(
            "Resuming from {}: {} indices processed, {} stars recorded",
            path.display(),
            checkpoint.processed,
            checkpoint.records.len()
        );
        Ok(checkpoint)
    }

    /// Write atomically: a temporary sibling file renamed over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(self)?)?;
        std::fs::rename(&tmp, path)?;
        log::debug!(
            "Checkpoint saved to {} ({} indices processed)",
            path.display(),
            self.processed
        );
        Ok(())
    }
}
