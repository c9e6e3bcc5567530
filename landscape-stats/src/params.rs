//! Model constants for the aggregation, passed explicitly.

use serde::{Deserialize, Serialize};

use landscape_core::{Family, FixedResidue};

use crate::error::{Result, StatsError};

/// Immutable configuration of the statistical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Primes up to this bound enter the singular-series product.
    pub prime_limit: u64,
    /// Residues P is known to take; they turn S(k) into S_cond(k).
    pub conditioning: Vec<FixedResidue>,
    /// χ² bins are pooled until each expects at least this many gaps.
    pub chi2_min_expected: f64,
    /// Equal-width bins for the gap uniformity test.
    pub uniformity_bins: usize,
    /// Gaps at which the nearest-satellite CDF is tabulated.
    pub cdf_thresholds: Vec<u64>,
    /// Equal-count bands for density against n.
    pub density_bands: usize,
    /// Largest per-star count listed in the Poisson table.
    pub poisson_max_count: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            prime_limit: 5000,
            conditioning: vec![FixedResidue { prime: 3, residue: 1 }],
            chi2_min_expected: 5.0,
            uniformity_bins: 10,
            cdf_thresholds: vec![50, 100, 200, 500, 1000, 2000, 3000],
            density_bands: 6,
            poisson_max_count: 14,
        }
    }
}

impl ModelParams {
    /// Defaults conditioned on every fixed residue of `family`.
    pub fn for_family(family: &dyn Family) -> Self {
        Self {
            conditioning: family.fixed_residues().to_vec(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prime_limit < 2 {
            return Err(StatsError::InvalidParams("prime_limit must be >= 2".into()));
        }
        if self.chi2_min_expected.is_nan() || self.chi2_min_expected <= 0.0 {
            return Err(StatsError::InvalidParams(
                "chi2_min_expected must be positive".into(),
            ));
        }
        if self.uniformity_bins < 2 {
            return Err(StatsError::InvalidParams("uniformity_bins must be >= 2".into()));
        }
        if self.density_bands == 0 {
            return Err(StatsError::InvalidParams("density_bands must be positive".into()));
        }
        if let Some(f) = self.conditioning.iter().find(|f| f.prime < 2 || f.residue >= f.prime) {
            return Err(StatsError::InvalidParams(format!(
                "bad conditioning residue {} mod {}",
                f.residue, f.prime
            )));
        }
        Ok(())
    }
}
