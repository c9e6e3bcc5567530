//! Nearest-satellite distribution and satellite density against n.

use num_bigint::BigUint;
use serde::Serialize;

use landscape_core::model::decimal;

use crate::population::{Population, StarSample};
use crate::special::ks_pvalue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdfPoint {
    pub k: u64,
    pub empirical: f64,
    pub model: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KsTest {
    pub n: usize,
    pub statistic: f64,
    pub p_value: f64,
}

/// Fraction of stars whose nearest satellite lies within `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRow {
    pub threshold: u64,
    pub observed: f64,
    /// 1 - exp(-t / ln P), averaged over stars.
    pub cramer: f64,
    /// 1 - exp(-t / (3 ln P)): one chance per three integers, the variant
    /// behind the published nearest-satellite ratios.
    pub cramer_thinned: f64,
    /// The conditioned Hardy–Littlewood model at t.
    pub hardy_littlewood: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestComparison {
    /// Stars with at least one satellite; the others have no nearest gap.
    pub stars: usize,
    pub cdf: Vec<CdfPoint>,
    pub ks: KsTest,
    pub thresholds: Vec<ThresholdRow>,
}

/// Per-star non-homogeneous Poisson model of the nearest gap, conditioned
/// on at least one satellite in the window.
struct NearestModel<'a> {
    /// Σ_{j <= k} S_cond(j), indexed by k - 1.
    cumulative: Vec<f64>,
    stars: Vec<&'a StarSample>,
}

impl<'a> NearestModel<'a> {
    fn new(table: &[f64], stars: Vec<&'a StarSample>) -> Self {
        let cumulative = table
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect();
        Self { cumulative, stars }
    }

    fn intensity(&self, k: u64) -> f64 {
        if k == 0 {
            return 0.0;
        }
        let idx = (k as usize).min(self.cumulative.len()) - 1;
        self.cumulative[idx]
    }

    /// Mean over stars of F_s(k) / F_s(R), F_s(k) = 1 - exp(-Λ(k) / ln P_s).
    fn cdf(&self, k: u64) -> f64 {
        if self.stars.is_empty() || self.cumulative.is_empty() {
            return 0.0;
        }
        let at_k = self.intensity(k);
        let at_r = self.intensity(self.cumulative.len() as u64);
        let total: f64 = self
            .stars
            .iter()
            .map(|s| {
                let full = 1.0 - (-at_r / s.ln_p).exp();
                if full <= 0.0 {
                    0.0
                } else {
                    (1.0 - (-at_k / s.ln_p).exp()) / full
                }
            })
            .sum();
        total / self.stars.len() as f64
    }
}

/// Mean over stars of 1 - exp(-t / (spacing · ln P)).
fn cramer_cdf(stars: &[&StarSample], t: f64, spacing: f64) -> f64 {
    if stars.is_empty() {
        return 0.0;
    }
    stars
        .iter()
        .map(|s| 1.0 - (-t / (spacing * s.ln_p)).exp())
        .sum::<f64>()
        / stars.len() as f64
}

/// Compare the empirical nearest-gap CDF with the model; `table[k - 1]`
/// is S_cond(k) for k up to the radius.
pub fn compare_nearest(population: &Population, table: &[f64], thresholds: &[u64]) -> NearestComparison {
    let stars: Vec<&StarSample> = population.samples.iter().filter(|s| !s.gaps.is_empty()).collect();
    let mut nearest: Vec<u64> = stars.iter().filter_map(|s| s.nearest()).collect();
    nearest.sort_unstable();
    let count = nearest.len();
    let model = NearestModel::new(table, stars);

    let radius = table.len() as u64;
    let support: Vec<u64> = (2..=radius)
        .step_by(2)
        .filter(|&k| table[(k - 1) as usize] > 0.0 || nearest.binary_search(&k).is_ok())
        .collect();

    let empirical_at = |k: u64| -> f64 {
        if count == 0 {
            return 0.0;
        }
        nearest.partition_point(|&g| g <= k) as f64 / count as f64
    };

    let cdf: Vec<CdfPoint> = support
        .iter()
        .map(|&k| CdfPoint {
            k,
            empirical: empirical_at(k),
            model: model.cdf(k),
        })
        .collect();

    let statistic = cdf
        .iter()
        .map(|p| (p.empirical - p.model).abs())
        .fold(0.0, f64::max);
    let ks = KsTest {
        n: count,
        statistic,
        p_value: ks_pvalue(count, statistic),
    };

    let threshold_rows = thresholds
        .iter()
        .map(|&t| {
            let observed = empirical_at(t);
            let cramer = cramer_cdf(&model.stars, t as f64, 1.0);
            ThresholdRow {
                threshold: t,
                observed,
                cramer,
                cramer_thinned: cramer_cdf(&model.stars, t as f64, 3.0),
                hardy_littlewood: model.cdf(t),
                ratio: if cramer > 0.0 { observed / cramer } else { 0.0 },
            }
        })
        .collect();

    NearestComparison {
        stars: count,
        cdf,
        ks,
        thresholds: threshold_rows,
    }
}

/// Observed vs Cramér satellite count for a band of consecutive stars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityBand {
    #[serde(with = "decimal")]
    pub n_lo: BigUint,
    #[serde(with = "decimal")]
    pub n_hi: BigUint,
    pub stars: usize,
    pub observed_mean: f64,
    /// Mean of R / ln P over the band.
    pub cramer_mean: f64,
    pub ratio: f64,
}

/// Split the stars (ascending n) into `bands` groups of near-equal size.
pub fn density_bands(population: &Population, radius: u64, bands: usize) -> Vec<DensityBand> {
    let samples = &population.samples;
    let bands = bands.min(samples.len());
    if bands == 0 {
        return Vec::new();
    }
    (0..bands)
        .map(|i| {
            let band = &samples[i * samples.len() / bands..(i + 1) * samples.len() / bands];
            let size = band.len() as f64;
            let observed_mean = band.iter().map(|s| s.gaps.len() as f64).sum::<f64>() / size;
            let cramer_mean = band.iter().map(|s| radius as f64 / s.ln_p).sum::<f64>() / size;
            DensityBand {
                n_lo: band[0].n.clone(),
                n_hi: band[band.len() - 1].n.clone(),
                stars: band.len(),
                observed_mean,
                cramer_mean,
                ratio: if cramer_mean > 0.0 { observed_mean / cramer_mean } else { 0.0 },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::singular::SingularSeries;
    use landscape_core::FixedResidue;

    fn sample(n: u64, gaps: &[u64]) -> StarSample {
        StarSample {
            n: BigUint::from(n),
            ln_p: 1100.0,
            gaps: gaps.to_vec(),
        }
    }

    fn table(radius: u64) -> Vec<f64> {
        SingularSeries::new(5000, &[FixedResidue { prime: 3, residue: 1 }]).table(radius)
    }

    #[test]
    fn test_model_cdf_reaches_one_at_radius() {
        let population = Population {
            samples: vec![sample(1, &[2]), sample(2, &[60, 90]), sample(3, &[])],
            ..Population::default()
        };
        let comparison = compare_nearest(&population, &table(100), &[50, 100]);
        assert_eq!(comparison.stars, 2);
        let last = comparison.cdf.last().unwrap();
        assert_eq!(last.k, 98);
        assert!((last.empirical - 1.0).abs() < 1e-12);
        assert!(last.model > 0.95 && last.model <= 1.0);
        assert!(comparison.cdf.windows(2).all(|w| w[0].model <= w[1].model));
        assert!((comparison.thresholds[1].hardy_littlewood - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_rows() {
        let population = Population {
            samples: vec![sample(1, &[2]), sample(2, &[60, 90])],
            ..Population::default()
        };
        let comparison = compare_nearest(&population, &table(100), &[50]);
        let row = &comparison.thresholds[0];
        assert!((row.observed - 0.5).abs() < 1e-12);
        let cramer = 1.0 - (-50.0f64 / 1100.0).exp();
        assert!((row.cramer - cramer).abs() < 1e-12);
        assert!((row.ratio - 0.5 / cramer).abs() < 1e-9);
        let thinned = 1.0 - (-50.0f64 / 3300.0).exp();
        assert!((row.cramer_thinned - thinned).abs() < 1e-12);
        assert!(row.cramer_thinned < row.cramer);
    }

    #[test]
    fn test_ks_statistic_bounds() {
        let population = Population {
            samples: (1..=40).map(|n| sample(n, &[2 * ((n % 10) + 1) * 3])).collect(),
            ..Population::default()
        };
        let comparison = compare_nearest(&population, &table(100), &[]);
        assert_eq!(comparison.ks.n, 40);
        assert!(comparison.ks.statistic > 0.0 && comparison.ks.statistic <= 1.0);
        assert!(comparison.ks.p_value >= 0.0 && comparison.ks.p_value <= 1.0);
    }

    #[test]
    fn test_no_satellites() {
        let population = Population {
            samples: vec![sample(1, &[])],
            ..Population::default()
        };
        let comparison = compare_nearest(&population, &table(50), &[10]);
        assert_eq!(comparison.stars, 0);
        assert_eq!(comparison.ks.p_value, 1.0);
        assert_eq!(comparison.thresholds[0].ratio, 0.0);
    }

    #[test]
    fn test_density_bands() {
        let population = Population {
            samples: (1..=7).map(|n| sample(n, &vec![2; n as usize % 3])).collect(),
            ..Population::default()
        };
        let bands = density_bands(&population, 1100, 3);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands.iter().map(|b| b.stars).sum::<usize>(), 7);
        assert_eq!(bands[0].n_lo, BigUint::from(1u32));
        assert_eq!(bands[2].n_hi, BigUint::from(7u32));
        assert!(bands.iter().all(|b| (b.cramer_mean - 1.0).abs() < 1e-12));
        assert_eq!(density_bands(&population, 1100, 50).len(), 7);
        assert!(density_bands(&Population::default(), 1100, 3).is_empty());
    }
}
