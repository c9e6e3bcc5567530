//! Main-star location: n such that Q(n) is prime.

use num_bigint::BigUint;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use landscape_core::{quick_reject, Family, LandscapeError, MainStar, PrimalityOracle};

use crate::config::{IndexSource, Indices};

/// Counters describing how candidates were disposed of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocatorStats {
    pub examined: usize,
    pub quick_rejected: usize,
    pub oracle_calls: usize,
    pub stars: usize,
    pub undecided: usize,
}

impl LocatorStats {
    pub fn merge(&mut self, other: &LocatorStats) {
        self.examined += other.examined;
        self.quick_rejected += other.quick_rejected;
        self.oracle_calls += other.oracle_calls;
        self.stars += other.stars;
        self.undecided += other.undecided;
    }
}

/// Verdict for a single index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexVerdict {
    QuickRejected,
    Composite,
    Star(MainStar),
}

/// An index whose value the oracle could not classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndecidedIndex {
    #[serde(with = "landscape_core::model::decimal")]
    pub n: BigUint,
    pub reason: String,
}

/// Stars found over a batch of indices, in ascending n.
#[derive(Debug, Clone, Default)]
pub struct LocatorReport {
    pub stars: Vec<MainStar>,
    pub undecided: Vec<UndecidedIndex>,
    pub stats: LocatorStats,
}

/// Drives the family and the oracle over a set of indices.
pub struct StarLocator<'a> {
    family: &'a dyn Family,
    oracle: &'a PrimalityOracle,
}

impl<'a> StarLocator<'a> {
    pub fn new(family: &'a dyn Family, oracle: &'a PrimalityOracle) -> Self {
        Self { family, oracle }
    }

    /// Compute Q(n), pre-filter it, and ask the oracle.
    pub fn examine(&self, n: &BigUint) -> Result<IndexVerdict, LandscapeError> {
        let value = self.family.value(n)?;
        if quick_reject(&value) {
            return Ok(IndexVerdict::QuickRejected);
        }
        if self.oracle.check(&value)? {
            Ok(IndexVerdict::Star(MainStar::new(n.clone(), value)))
        } else {
            Ok(IndexVerdict::Composite)
        }
    }

    /// Lazy sequence of stars over `source`.
    ///
    /// The source is validated up front; re-running over the same source
    /// yields the same stars in the same order.
    pub fn find_stars(&self, source: &IndexSource) -> Result<Stars<'_, 'a>, LandscapeError> {
        source.validate()?;
        Ok(Stars {
            locator: self,
            indices: source.indices(),
            stats: LocatorStats::default(),
        })
    }

    /// Examine a batch of indices in parallel; stars come back sorted by n.
    pub fn locate_batch(&self, batch: &[BigUint]) -> LocatorReport {
        let verdicts: Vec<(usize, Result<IndexVerdict, LandscapeError>)> = batch
            .par_iter()
            .enumerate()
            .map(|(i, n)| (i, self.examine(n)))
            .collect();

        let mut report = LocatorReport::default();
        for (i, verdict) in verdicts {
            report.stats.examined += 1;
            match verdict {
                Ok(IndexVerdict::QuickRejected) => report.stats.quick_rejected += 1,
                Ok(IndexVerdict::Composite) => report.stats.oracle_calls += 1,
                Ok(IndexVerdict::Star(star)) => {
                    report.stats.oracle_calls += 1;
                    report.stats.stars += 1;
                    report.stars.push(star);
                }
                Err(e) => {
                    log::warn!("Index n={} left undecided: {}", batch[i], e);
                    report.stats.undecided += 1;
                    report.undecided.push(UndecidedIndex {
                        n: batch[i].clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.stars.sort_by(|a, b| a.n.cmp(&b.n));
        report
    }

    /// Parallel counterpart of [`StarLocator::find_stars`].
    pub fn find_stars_par(&self, source: &IndexSource) -> Result<LocatorReport, LandscapeError> {
        source.validate()?;
        let batch: Vec<BigUint> = source.indices().collect();
        let report = self.locate_batch(&batch);
        log::info!(
            "Located {} stars among {} indices ({} quick-rejected, {} oracle calls)",
            report.stats.stars,
            report.stats.examined,
            report.stats.quick_rejected,
            report.stats.oracle_calls
        );
        Ok(report)
    }
}

/// Lazy iterator of main stars; yields an error for undecidable indices.
pub struct Stars<'l, 'a> {
    locator: &'l StarLocator<'a>,
    indices: Indices,
    stats: LocatorStats,
}

impl Stars<'_, '_> {
    pub fn stats(&self) -> &LocatorStats {
        &self.stats
    }
}

impl Iterator for Stars<'_, '_> {
    type Item = Result<MainStar, LandscapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        for n in self.indices.by_ref() {
            self.stats.examined += 1;
            match self.locator.examine(&n) {
                Ok(IndexVerdict::QuickRejected) => self.stats.quick_rejected += 1,
                Ok(IndexVerdict::Composite) => self.stats.oracle_calls += 1,
                Ok(IndexVerdict::Star(star)) => {
                    self.stats.oracle_calls += 1;
                    self.stats.stars += 1;
                    return Some(Ok(star));
                }
                Err(e) => {
                    self.stats.undecided += 1;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape_core::sieve::residue;
    use landscape_core::{OracleConfig, PowerDifference};

    fn fast_oracle() -> PrimalityOracle {
        PrimalityOracle::new(OracleConfig {
            rounds: 2,
            ..OracleConfig::default()
        })
    }

    fn star_indices(stars: &[MainStar]) -> Vec<BigUint> {
        stars.iter().map(|s| s.n.clone()).collect()
    }

    #[test]
    fn test_finds_small_stars() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        let stars: Vec<MainStar> = locator
            .find_stars(&IndexSource::range(1, 100))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let expected: Vec<BigUint> = [13u32, 42, 66, 71, 87].into_iter().map(BigUint::from).collect();
        assert_eq!(star_indices(&stars), expected);
    }

    #[test]
    fn test_find_stars_is_restartable() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        let source = IndexSource::range(1, 120);
        let first: Vec<MainStar> = locator.find_stars(&source).unwrap().map(Result::unwrap).collect();
        let second: Vec<MainStar> = locator.find_stars(&source).unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        let source = IndexSource::range(1, 200);
        let sequential: Vec<MainStar> = locator.find_stars(&source).unwrap().map(Result::unwrap).collect();
        let parallel = locator.find_stars_par(&source).unwrap();
        assert_eq!(parallel.stars, sequential);
        assert_eq!(parallel.stats.examined, 199);
        assert_eq!(parallel.stats.stars, sequential.len());
        assert!(parallel.undecided.is_empty());
    }

    #[test]
    fn test_every_star_is_one_mod_6() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        for star in locator.find_stars(&IndexSource::range(1, 400)).unwrap() {
            let star = star.unwrap();
            assert_eq!(residue(&star.value, 6), 1, "Q({}) mod 6 != 1", star.n);
        }
    }

    #[test]
    fn test_zero_index_rejected_before_work() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        assert!(matches!(
            locator.find_stars(&IndexSource::range(0, 10)),
            Err(LandscapeError::IndexOutOfDomain(_))
        ));
        assert!(matches!(
            locator.find_stars_par(&IndexSource::list([5, 0])),
            Err(LandscapeError::IndexOutOfDomain(_))
        ));
    }

    #[test]
    fn test_stats_account_for_every_index() {
        let family = PowerDifference::default();
        let oracle = fast_oracle();
        let locator = StarLocator::new(&family, &oracle);
        let mut stars = locator.find_stars(&IndexSource::range(1, 100)).unwrap();
        let found = stars.by_ref().count();
        let stats = *stars.stats();
        assert_eq!(stats.examined, 99);
        assert_eq!(stats.stars, found);
        assert_eq!(stats.quick_rejected + stats.oracle_calls, stats.examined);
    }
}
