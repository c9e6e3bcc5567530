//! The set of stars a report is computed over.

use std::collections::BTreeMap;

use num_bigint::BigUint;

use landscape_core::{ln_big, StarRecord};

use crate::error::{Result, StatsError};
use crate::poisson::recover_zero_count;

/// One complete star as the statistics see it.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSample {
    pub n: BigUint,
    pub ln_p: f64,
    /// Satellite gaps, ascending.
    pub gaps: Vec<u64>,
}

impl StarSample {
    pub fn nearest(&self) -> Option<u64> {
        self.gaps.first().copied()
    }
}

/// Complete stars sorted by n, plus stars known only by count.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub samples: Vec<StarSample>,
    /// Stars with no satellite inferred from a Poisson fit; they have
    /// neither n nor P, and are weighted with the mean ln P.
    pub inferred_zero: usize,
    /// Stars whose scan did not complete; excluded from every reduction.
    pub incomplete: Vec<BigUint>,
}

/// ln Q(n) for Q(n) = n^e - (n-1)^e ≈ e·n^(e-1).
pub fn ln_power_difference(n: &BigUint, exponent: u32) -> f64 {
    (exponent as f64).ln() + (exponent as f64 - 1.0) * ln_big(n)
}

fn check_gaps(gaps: &[u64], radius: u64) -> Result<()> {
    match gaps.iter().find(|&&k| k < 2 || k > radius) {
        Some(&k) => Err(StatsError::GapOutOfWindow { k, radius }),
        None => Ok(()),
    }
}

impl Population {
    /// Complete records become samples; failed ones are set aside.
    pub fn from_records(records: &[StarRecord], radius: u64) -> Result<Self> {
        let mut population = Population::default();
        for record in records {
            match record.satellites() {
                Some(satellites) => {
                    let mut gaps: Vec<u64> = satellites.iter().map(|s| s.k).collect();
                    gaps.sort_unstable();
                    check_gaps(&gaps, radius)?;
                    population.samples.push(StarSample {
                        n: record.star.n.clone(),
                        ln_p: ln_big(&record.star.value),
                        gaps,
                    });
                }
                None => population.incomplete.push(record.star.n.clone()),
            }
        }
        population.samples.sort_by(|a, b| a.n.cmp(&b.n));
        population.incomplete.sort();
        Ok(population)
    }

    /// A catalog lists (n, k) pairs only, so stars without satellites are
    /// missing; their number is recovered from the Poisson zero class.
    pub fn from_catalog(pairs: &[(BigUint, u64)], radius: u64, exponent: u32) -> Result<Self> {
        let mut by_star: BTreeMap<&BigUint, Vec<u64>> = BTreeMap::new();
        for (n, k) in pairs {
            by_star.entry(n).or_default().push(*k);
        }

        let mut samples = Vec::with_capacity(by_star.len());
        for (n, mut gaps) in by_star {
            gaps.sort_unstable();
            gaps.dedup();
            check_gaps(&gaps, radius)?;
            samples.push(StarSample {
                n: n.clone(),
                ln_p: ln_power_difference(n, exponent),
                gaps,
            });
        }

        let satellites: usize = samples.iter().map(|s| s.gaps.len()).sum();
        let inferred_zero = recover_zero_count(samples.len(), satellites);
        log::info!(
            "Catalog: {} stars with satellites, {} inferred without",
            samples.len(),
            inferred_zero
        );
        Ok(Population {
            samples,
            inferred_zero,
            incomplete: Vec::new(),
        })
    }

    /// Stars entering the count statistics.
    pub fn star_count(&self) -> usize {
        self.samples.len() + self.inferred_zero
    }

    pub fn satellite_count(&self) -> usize {
        self.samples.iter().map(|s| s.gaps.len()).sum()
    }

    /// Per-star satellite counts, inferred zeros included.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.inferred_zero];
        counts.extend(self.samples.iter().map(|s| s.gaps.len()));
        counts
    }

    pub fn mean_ln_p(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.ln_p).sum::<f64>() / self.samples.len() as f64
    }

    /// Σ 1/ln P over every star; the expected count at gap k is S_cond(k) times this.
    pub fn inverse_ln_sum(&self) -> f64 {
        let known: f64 = self.samples.iter().map(|s| 1.0 / s.ln_p).sum();
        let mean = self.mean_ln_p();
        if self.inferred_zero == 0 || mean <= 0.0 {
            return known;
        }
        known + self.inferred_zero as f64 / mean
    }

    pub fn gaps(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().flat_map(|s| s.gaps.iter().copied())
    }
}
