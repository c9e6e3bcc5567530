//! Satellite census around a main star: every prime P - k with 2 <= k <= R.

use rayon::prelude::*;
use serde::Serialize;

use landscape_core::{quick_reject, Admissibility, LandscapeError, MainStar, PrimalityOracle, Satellite};

use crate::config::{validate_radius, Granularity};

/// Per-star scan counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Even gaps that passed the admissibility filter.
    pub candidates: usize,
    pub quick_rejected: usize,
    pub oracle_calls: usize,
    pub satellites: usize,
    /// Whether the admissibility filter was active for this star.
    pub filtered: bool,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.candidates += other.candidates;
        self.quick_rejected += other.quick_rejected;
        self.oracle_calls += other.oracle_calls;
        self.satellites += other.satellites;
    }
}

enum GapVerdict {
    QuickRejected,
    Composite,
    Satellite(Satellite),
}

/// Scans the even gaps below a star for primes.
pub struct SatelliteScanner<'a> {
    oracle: &'a PrimalityOracle,
    rule: Admissibility,
    granularity: Granularity,
}

impl<'a> SatelliteScanner<'a> {
    /// `rule` is the family's admissibility predicate; pass
    /// [`Admissibility::permissive`] to test every even gap.
    pub fn new(oracle: &'a PrimalityOracle, rule: Admissibility, granularity: Granularity) -> Self {
        Self {
            oracle,
            rule,
            granularity,
        }
    }

    /// All satellites of `star` within `radius`, in strictly increasing k.
    pub fn scan(&self, star: &MainStar, radius: u64) -> Result<Vec<Satellite>, LandscapeError> {
        self.scan_with_stats(star, radius).map(|(satellites, _)| satellites)
    }

    pub fn scan_with_stats(
        &self,
        star: &MainStar,
        radius: u64,
    ) -> Result<(Vec<Satellite>, ScanStats), LandscapeError> {
        validate_radius(radius)?;

        let filter = self.filter_for(star, radius);
        // Odd k makes P - k even; those are never tested
        let gaps: Vec<u64> = (2..=radius)
            .step_by(2)
            .filter(|&k| filter.map_or(true, |rule| rule.admits(k)))
            .collect();

        let verdicts: Vec<GapVerdict> = match self.granularity {
            Granularity::PerStar => gaps
                .iter()
                .map(|&k| self.test_gap(star, k))
                .collect::<Result<_, _>>()?,
            Granularity::PerCandidate => gaps
                .par_iter()
                .map(|&k| self.test_gap(star, k))
                .collect::<Result<_, _>>()?,
        };

        let mut stats = ScanStats {
            candidates: gaps.len(),
            filtered: filter.is_some(),
            ..ScanStats::default()
        };
        let mut satellites = Vec::new();
        for verdict in verdicts {
            match verdict {
                GapVerdict::QuickRejected => stats.quick_rejected += 1,
                GapVerdict::Composite => stats.oracle_calls += 1,
                GapVerdict::Satellite(satellite) => {
                    stats.oracle_calls += 1;
                    satellites.push(satellite);
                }
            }
        }
        stats.satellites = satellites.len();

        log::debug!(
            "Star n={}: {} satellites among {} candidates (R={})",
            star.n,
            satellites.len(),
            stats.candidates,
            radius
        );
        Ok((satellites, stats))
    }

    /// The admissibility rule, if it is safe to use for this star.
    fn filter_for(&self, star: &MainStar, radius: u64) -> Option<&Admissibility> {
        if self.rule.residues().is_empty() {
            return None;
        }
        if !self.rule.holds_for(&star.value) {
            log::warn!(
                "Star n={} violates the family's fixed residues; scanning all even gaps",
                star.n
            );
            return None;
        }
        // P - k could itself be one of the fixed primes
        let floor = radius.saturating_add(self.rule.largest_prime());
        if star.value <= num_bigint::BigUint::from(floor) {
            return None;
        }
        Some(&self.rule)
    }

    fn test_gap(&self, star: &MainStar, k: u64) -> Result<GapVerdict, LandscapeError> {
        if star.value <= num_bigint::BigUint::from(k) {
            return Ok(GapVerdict::QuickRejected);
        }
        let candidate = &star.value - k;
        if quick_reject(&candidate) {
            return Ok(GapVerdict::QuickRejected);
        }
        if self.oracle.check(&candidate)? {
            Ok(GapVerdict::Satellite(Satellite {
                n: star.n.clone(),
                k,
                value: candidate,
            }))
        } else {
            Ok(GapVerdict::Composite)
        }
    }
}
