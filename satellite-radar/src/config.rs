//! Run configuration: which indices to examine, how far to scan, and how.

use std::path::PathBuf;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use landscape_core::model::{decimal, decimal_vec};
use landscape_core::{LandscapeError, OracleConfig};

use crate::error::{RadarError, Result};

/// Source of candidate indices n.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexSource {
    /// Every n in the half-open range [lo, hi).
    Range {
        #[serde(with = "decimal")]
        lo: BigUint,
        #[serde(with = "decimal")]
        hi: BigUint,
    },
    /// An explicit list; duplicates are dropped and order is ascending.
    List {
        #[serde(with = "decimal_vec")]
        indices: Vec<BigUint>,
    },
    /// Quadruplet bases: each base b stands for b, b+1, b+2, b+3.
    Quadruplets {
        #[serde(with = "decimal_vec")]
        bases: Vec<BigUint>,
    },
}

impl IndexSource {
    pub fn range(lo: u64, hi: u64) -> Self {
        IndexSource::Range {
            lo: BigUint::from(lo),
            hi: BigUint::from(hi),
        }
    }

    pub fn list<I: IntoIterator<Item = u64>>(indices: I) -> Self {
        IndexSource::List {
            indices: indices.into_iter().map(BigUint::from).collect(),
        }
    }

    /// Reject n < 1 and empty sources.
    pub fn validate(&self) -> std::result::Result<(), LandscapeError> {
        match self {
            IndexSource::Range { lo, hi } => {
                if lo.is_zero() {
                    return Err(LandscapeError::IndexOutOfDomain(lo.to_string()));
                }
                if lo >= hi {
                    return Err(LandscapeError::EmptyRange {
                        lo: lo.to_string(),
                        hi: hi.to_string(),
                    });
                }
                Ok(())
            }
            IndexSource::List { indices: values } | IndexSource::Quadruplets { bases: values } => {
                if values.is_empty() {
                    return Err(LandscapeError::EmptyList);
                }
                match values.iter().find(|n| n.is_zero()) {
                    Some(zero) => Err(LandscapeError::IndexOutOfDomain(zero.to_string())),
                    None => Ok(()),
                }
            }
        }
    }

    /// Lazy ascending iterator over the indices.
    pub fn indices(&self) -> Indices {
        match self {
            IndexSource::Range { lo, hi } => Indices::Range {
                next: lo.clone(),
                end: hi.clone(),
            },
            IndexSource::List { indices } => Indices::Listed(sorted_unique(indices.clone()).into_iter()),
            IndexSource::Quadruplets { bases } => {
                let expanded = bases
                    .iter()
                    .flat_map(|b| (0u32..4).map(move |offset| b + offset))
                    .collect();
                Indices::Listed(sorted_unique(expanded).into_iter())
            }
        }
    }

    /// Indices after skipping the first `offset` of them.
    pub fn indices_from(&self, offset: usize) -> Indices {
        match self {
            IndexSource::Range { lo, hi } => Indices::Range {
                next: lo + BigUint::from(offset),
                end: hi.clone(),
            },
            _ => {
                let mut indices = self.indices();
                if offset > 0 {
                    indices.nth(offset - 1);
                }
                indices
            }
        }
    }

    /// Short description used to fingerprint checkpoints.
    pub fn describe(&self) -> String {
        match self {
            IndexSource::Range { lo, hi } => format!("range[{},{})", lo, hi),
            IndexSource::List { indices } => {
                format!("list({};{})", indices.len(), fold_digest(indices))
            }
            IndexSource::Quadruplets { bases } => {
                format!("quadruplets({};{})", bases.len(), fold_digest(bases))
            }
        }
    }
}

fn sorted_unique(mut values: Vec<BigUint>) -> Vec<BigUint> {
    values.sort();
    values.dedup();
    values
}

/// Order-independent digest of a list of indices.
fn fold_digest(values: &[BigUint]) -> String {
    let sum: BigUint = values.iter().sum();
    let xor = values
        .iter()
        .map(|v| v.iter_u64_digits().next().unwrap_or(0))
        .fold(0u64, |acc, low| acc ^ low.rotate_left(17));
    format!("{}:{:x}", sum, xor)
}

/// Ascending indices of an [`IndexSource`].
#[derive(Debug, Clone)]
pub enum Indices {
    Range { next: BigUint, end: BigUint },
    Listed(std::vec::IntoIter<BigUint>),
}

impl Iterator for Indices {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        match self {
            Indices::Range { next, end } => {
                if *next >= *end {
                    return None;
                }
                let current = next.clone();
                *next += BigUint::one();
                Some(current)
            }
            Indices::Listed(iter) => iter.next(),
        }
    }
}

/// Scan window: radius and index source. Immutable per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWindow {
    pub radius: u64,
    pub indices: IndexSource,
}

impl ScanWindow {
    pub fn new(radius: u64, indices: IndexSource) -> Self {
        Self { radius, indices }
    }

    pub fn validate(&self) -> std::result::Result<(), LandscapeError> {
        validate_radius(self.radius)?;
        self.indices.validate()
    }
}

pub fn validate_radius(radius: u64) -> std::result::Result<(), LandscapeError> {
    if radius < 2 {
        return Err(LandscapeError::RadiusTooSmall(radius));
    }
    Ok(())
}

/// Unit of parallel work for satellite scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One task per star; each star is swept sequentially.
    #[default]
    PerStar,
    /// One task per (star, k) candidate.
    PerCandidate,
}

fn default_exponent() -> u32 {
    landscape_core::PowerDifference::DEFAULT_EXPONENT
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    10_000
}

/// Full configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub window: ScanWindow,
    #[serde(default = "default_exponent")]
    pub exponent: u32,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub granularity: Granularity,
    /// Skip gaps ruled out by the family's fixed residues.
    #[serde(default = "default_true")]
    pub admissibility_filter: bool,
    /// Worker threads; `None` uses every core.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Where completed stars are checkpointed, if anywhere.
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
    /// Indices processed between checkpoints.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl RunConfig {
    pub fn new(window: ScanWindow) -> Self {
        Self {
            window,
            exponent: default_exponent(),
            oracle: OracleConfig::default(),
            granularity: Granularity::default(),
            admissibility_filter: true,
            threads: None,
            checkpoint: None,
            chunk_size: default_chunk_size(),
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        if self.chunk_size == 0 {
            return Err(RadarError::Config("chunk_size must be positive".into()));
        }
        if self.threads == Some(0) {
            return Err(RadarError::Config("threads must be positive".into()));
        }
        Ok(())
    }

    /// Identifies the computation so a checkpoint is only reused by the same run.
    pub fn fingerprint(&self) -> String {
        format!(
            "e={};R={};filter={};rounds={};fallback={};{}",
            self.exponent,
            self.window.radius,
            self.admissibility_filter,
            self.oracle.rounds,
            self.oracle.fallback_bound,
            self.window.indices.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_indices_are_half_open() {
        let ns: Vec<BigUint> = IndexSource::range(3, 6).indices().collect();
        assert_eq!(ns, vec![3u32, 4, 5].into_iter().map(BigUint::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_list_is_sorted_and_deduplicated() {
        let ns: Vec<BigUint> = IndexSource::list([9, 2, 9, 5]).indices().collect();
        assert_eq!(ns, vec![2u32, 5, 9].into_iter().map(BigUint::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_quadruplets_expand_to_four() {
        let source = IndexSource::Quadruplets {
            bases: vec![BigUint::from(10u32), BigUint::from(12u32)],
        };
        let ns: Vec<BigUint> = source.indices().collect();
        let expected: Vec<BigUint> = (10u32..16).map(BigUint::from).collect();
        assert_eq!(ns, expected);
    }

    #[test]
    fn test_indices_from_offset() {
        let skipped: Vec<BigUint> = IndexSource::range(3, 8).indices_from(2).collect();
        let expected: Vec<BigUint> = (5u32..8).map(BigUint::from).collect();
        assert_eq!(skipped, expected);

        let listed: Vec<BigUint> = IndexSource::list([7, 1, 4]).indices_from(1).collect();
        assert_eq!(listed, vec![BigUint::from(4u32), BigUint::from(7u32)]);
        assert_eq!(IndexSource::list([7]).indices_from(5).count(), 0);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            IndexSource::range(0, 5).validate(),
            Err(LandscapeError::IndexOutOfDomain("0".into()))
        );
        assert!(matches!(
            IndexSource::range(5, 5).validate(),
            Err(LandscapeError::EmptyRange { .. })
        ));
        assert_eq!(
            IndexSource::list(Vec::<u64>::new()).validate(),
            Err(LandscapeError::EmptyList)
        );
        assert!(IndexSource::list([3, 0]).validate().is_err());
        assert_eq!(
            ScanWindow::new(1, IndexSource::range(1, 2)).validate(),
            Err(LandscapeError::RadiusTooSmall(1))
        );
        assert!(ScanWindow::new(2, IndexSource::range(1, 2)).validate().is_ok());
    }

    #[test]
    fn test_config_json_defaults() {
        let json = r#"{"window": {"radius": 100, "indices": {"kind": "range", "lo": "1", "hi": "50"}}}"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.exponent, 47);
        assert_eq!(config.oracle, OracleConfig::default());
        assert!(config.admissibility_filter);
        assert_eq!(config.granularity, Granularity::PerStar);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fingerprint_tracks_radius_and_source() {
        let a = RunConfig::new(ScanWindow::new(100, IndexSource::range(1, 50)));
        let b = RunConfig::new(ScanWindow::new(200, IndexSource::range(1, 50)));
        let c = RunConfig::new(ScanWindow::new(100, IndexSource::list([1, 2])));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_oracle() {
        let a = RunConfig::new(ScanWindow::new(100, IndexSource::range(1, 50)));
        let mut fewer_rounds = a.clone();
        fewer_rounds.oracle.rounds = 5;
        let mut smaller_fallback = a.clone();
        smaller_fallback.oracle.fallback_bound = 1000;
        assert_ne!(a.fingerprint(), fewer_rounds.fingerprint());
        assert_ne!(a.fingerprint(), smaller_fallback.fingerprint());
    }
}
