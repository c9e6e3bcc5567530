//! End-to-end run: locate stars chunk by chunk, scan each one, checkpoint.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use num_bigint::BigUint;
use rayon::prelude::*;
use serde::Serialize;

use landscape_core::{
    canonical_order, Admissibility, Family, LandscapeError, MainStar, PowerDifference,
    PrimalityOracle, Satellite, StarRecord,
};

use crate::checkpoint::Checkpoint;
use crate::config::RunConfig;
use crate::error::{RadarError, Result};
use crate::locator::{LocatorStats, StarLocator, UndecidedIndex};
use crate::scanner::{SatelliteScanner, ScanStats};

/// Satellites of one star and the counters of its scan.
pub type StarScan = std::result::Result<(Vec<Satellite>, ScanStats), LandscapeError>;

/// Everything a run produced, records sorted by n.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub family: String,
    pub radius: u64,
    pub records: Vec<StarRecord>,
    pub undecided: Vec<UndecidedIndex>,
    /// Counters for the indices processed by this invocation only.
    pub locator: LocatorStats,
    pub scan: ScanStats,
    /// Indices already covered by a checkpoint when the run started.
    pub resumed_from: usize,
    pub elapsed_secs: f64,
}

impl RunOutput {
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_complete()).count()
    }

    pub fn satellite_count(&self) -> usize {
        self.records
            .iter()
            .filter_map(StarRecord::satellites)
            .map(<[_]>::len)
            .sum()
    }
}

/// A validated run: family and oracle built from a [`RunConfig`].
pub struct Pipeline {
    config: RunConfig,
    family: PowerDifference,
    oracle: PrimalityOracle,
}

impl Pipeline {
    /// Validates the configuration; nothing is computed yet.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let family = PowerDifference::new(config.exponent)?;
        let oracle = PrimalityOracle::new(config.oracle);
        Ok(Self {
            config,
            family,
            oracle,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn family(&self) -> &PowerDifference {
        &self.family
    }

    pub fn run(&self) -> Result<RunOutput> {
        let rule = if self.config.admissibility_filter {
            self.family.admissibility()
        } else {
            Admissibility::permissive()
        };
        let scanner = SatelliteScanner::new(&self.oracle, rule, self.config.granularity);
        self.run_with(|star, radius| scanner.scan_with_stats(star, radius))
    }

    /// Run with `scan` in place of the satellite scanner.
    ///
    /// An error or panic from `scan` fails that star only.
    pub fn run_with<F>(&self, scan: F) -> Result<RunOutput>
    where
        F: Fn(&MainStar, u64) -> StarScan + Sync,
    {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| RadarError::ThreadPool(e.to_string()))?;
                pool.install(|| self.run_chunks(&scan))
            }
            None => self.run_chunks(&scan),
        }
    }

    fn run_chunks<F>(&self, scan: &F) -> Result<RunOutput>
    where
        F: Fn(&MainStar, u64) -> StarScan + Sync,
    {
        let start = Instant::now();
        let fingerprint = self.config.fingerprint();
        let mut checkpoint = match &self.config.checkpoint {
            Some(path) => Checkpoint::load_or_new(path, &fingerprint)?,
            None => Checkpoint::new(fingerprint),
        };
        let resumed_from = checkpoint.processed;

        let locator = StarLocator::new(&self.family, &self.oracle);

        log::info!(
            "Run over {} with R={} ({}), resuming at index {}",
            self.config.window.indices.describe(),
            self.config.window.radius,
            self.family.name(),
            resumed_from
        );

        let mut indices = self.config.window.indices.indices_from(resumed_from);
        let mut locator_stats = LocatorStats::default();
        let mut scan_stats = ScanStats::default();
        loop {
            let batch: Vec<BigUint> = indices.by_ref().take(self.config.chunk_size).collect();
            if batch.is_empty() {
                break;
            }

            let report = locator.locate_batch(&batch);
            locator_stats.merge(&report.stats);

            let scanned: Vec<(StarRecord, ScanStats)> = report
                .stars
                .into_par_iter()
                .map(|star| self.scan_star(scan, star))
                .collect();
            for (record, stats) in scanned {
                scan_stats.merge(&stats);
                checkpoint.records.push(record);
            }
            checkpoint.undecided.extend(report.undecided);
            checkpoint.processed += batch.len();

            if let Some(path) = &self.config.checkpoint {
                checkpoint.save(path)?;
            }
            log::info!(
                "Processed {} indices: {} stars, {} satellites so far",
                checkpoint.processed,
                checkpoint.records.len(),
                scan_stats.satellites
            );
        }

        let mut records = checkpoint.records;
        canonical_order(&mut records);
        let mut undecided = checkpoint.undecided;
        undecided.sort_by(|a, b| a.n.cmp(&b.n));

        let output = RunOutput {
            family: self.family.name(),
            radius: self.config.window.radius,
            records,
            undecided,
            locator: locator_stats,
            scan: scan_stats,
            resumed_from,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        log::info!(
            "Run finished in {:.1}s: {} stars, {} satellites, {} failed, {} undecided",
            output.elapsed_secs,
            output.records.len(),
            output.satellite_count(),
            output.failed_count(),
            output.undecided.len()
        );
        Ok(output)
    }

    /// Scan one star; errors and panics become a failed record.
    fn scan_star<F>(&self, scan: &F, star: MainStar) -> (StarRecord, ScanStats)
    where
        F: Fn(&MainStar, u64) -> StarScan + Sync,
    {
        let radius = self.config.window.radius;
        match catch_unwind(AssertUnwindSafe(|| scan(&star, radius))) {
            Ok(Ok((satellites, stats))) => (StarRecord::complete(star, satellites), stats),
            Ok(Err(e)) => {
                log::error!("Scan of star n={} failed: {}", star.n, e);
                (StarRecord::failed(star, e.to_string()), ScanStats::default())
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "scan panicked".to_string());
                log::error!("Scan of star n={} panicked: {}", star.n, reason);
                (StarRecord::failed(star, format!("panic: {}", reason)), ScanStats::default())
            }
        }
    }
}
