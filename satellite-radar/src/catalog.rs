//! Quadruplet catalog: built-in bases plus bases scraped from search logs.

use std::collections::BTreeSet;
use std::path::Path;

use num_bigint::BigUint;
use regex::Regex;

use crate::config::IndexSource;
use crate::error::{RadarError, Result};

/// Quadruplet bases b (b..b+3 all main stars) known below 4e9.
pub const BUILTIN_QUADRUPLETS: [u64; 25] = [
    117309848, 136584738, 218787064, 411784485, 423600750, 523331634, 640399031, 987980498,
    1163461515, 1370439187, 1643105964, 1691581855, 1975860550, 1996430175, 2156109985,
    2367719045, 2559344807, 2646631730, 2682956949, 2859276863, 2862155914, 2922108368,
    3808591354, 3910149357, 3984049296,
];

const LOG_PATTERN: &str = r"(?:Sequence|QUADRUPLET):\s*(\d+)";
const PAIR_PATTERN: &str = r"^\s*(\d+)\s*[,;\s]\s*(\d+)\s*$";

/// Every base mentioned as `Sequence: <n>` or `QUADRUPLET: <n>` in `text`.
pub fn scrape_bases(text: &str) -> Result<Vec<BigUint>> {
    let re = Regex::new(LOG_PATTERN).map_err(|e| RadarError::Config(e.to_string()))?;
    Ok(re
        .captures_iter(text)
        .filter_map(|caps| BigUint::parse_bytes(caps[1].as_bytes(), 10))
        .collect())
}

/// Parse a satellite catalog: one `n k` (or `n,k`) pair per line.
///
/// Lines that are not a pair, such as headers and comments, are skipped.
pub fn parse_pairs(text: &str) -> Result<Vec<(BigUint, u64)>> {
    let re = Regex::new(PAIR_PATTERN).map_err(|e| RadarError::Config(e.to_string()))?;
    let mut pairs = Vec::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        let parsed = re.captures(line).and_then(|caps| {
            let n = BigUint::parse_bytes(caps[1].as_bytes(), 10)?;
            let k = caps[2].parse::<u64>().ok()?;
            Some((n, k))
        });
        match parsed {
            Some(pair) => pairs.push(pair),
            None if line.trim().is_empty() => {}
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("Skipped {} non-pair lines", skipped);
    }
    Ok(pairs)
}

/// Collects quadruplet bases from the built-in list and from log files.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    bases: BTreeSet<BigUint>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.extend(BUILTIN_QUADRUPLETS.iter().map(|&b| BigUint::from(b)));
        catalog
    }

    pub fn extend<I: IntoIterator<Item = BigUint>>(&mut self, bases: I) {
        self.bases.extend(bases);
    }

    /// Scrape every `*.log` and `*.txt` file directly inside `dir`.
    ///
    /// Files that cannot be read as UTF-8 are skipped with a warning.
    /// Returns the number of new bases.
    pub fn load_log_dir(&mut self, dir: &Path) -> Result<usize> {
        let before = self.bases.len();
        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("log") | Some("txt")
                    )
            })
            .collect();
        files.sort();

        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let found = scrape_bases(&text)?;
                    log::debug!("{}: {} bases", path.display(), found.len());
                    self.extend(found);
                }
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        let added = self.bases.len() - before;
        log::info!(
            "Catalog has {} bases after scanning {} ({} new)",
            self.bases.len(),
            dir.display(),
            added
        );
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Bases in ascending order.
    pub fn bases(&self) -> impl Iterator<Item = &BigUint> {
        self.bases.iter()
    }

    /// Index source covering b, b+1, b+2, b+3 for every base.
    pub fn to_source(&self) -> IndexSource {
        IndexSource::Quadruplets {
            bases: self.bases.iter().cloned().collect(),
        }
    }
}
