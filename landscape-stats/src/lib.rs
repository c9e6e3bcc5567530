//! Statistics of the satellite landscape.
//!
//! Reduces scanned stars (or a published (n, k) catalog) to the comparisons
//! against the Cramér model and the conditional Hardy–Littlewood singular
//! series: counts and dispersion, the per-gap histogram with its χ² test,
//! residue classes, the nearest-satellite CDF, and density against n.

pub mod error;
pub mod gaps;
pub mod nearest;
pub mod params;
pub mod poisson;
pub mod population;
pub mod singular;
pub mod special;

use num_bigint::BigUint;
use serde::Serialize;

use landscape_core::model::decimal_vec;
use landscape_core::StarRecord;

pub use error::{Result, StatsError};
pub use gaps::{ChiSquare, GapStatistics, Mod30Row, ResidueClasses};
pub use nearest::{CdfPoint, DensityBand, KsTest, NearestComparison, ThresholdRow};
pub use params::ModelParams;
pub use poisson::{PoissonFit, PoissonRow};
pub use population::{Population, StarSample};
pub use singular::SingularSeries;

/// Everything the aggregation computes for one run or catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub radius: u64,
    /// Stars in the count statistics, inferred zero-satellite stars included.
    pub stars: usize,
    pub inferred_zero: usize,
    /// Stars left out because their scan failed.
    #[serde(with = "decimal_vec")]
    pub incomplete: Vec<BigUint>,
    pub total_satellites: usize,
    pub mean_satellites: f64,
    pub dispersion_index: f64,
    pub mean_ln_p: f64,
    /// Mean of R / ln P.
    pub cramer_mean: f64,
    /// Mean of Σ_k S_cond(k) / ln P.
    pub hardy_littlewood_mean: f64,
    pub poisson: PoissonFit,
    pub gaps: Vec<GapStatistics>,
    pub residue_classes: ResidueClasses,
    pub chi2_hardy_littlewood: ChiSquare,
    pub uniformity: ChiSquare,
    pub mod30: Vec<Mod30Row>,
    pub nearest: NearestComparison,
    pub density: Vec<DensityBand>,
}

/// Computes a [`Report`] under fixed [`ModelParams`].
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    params: ModelParams,
    series: SingularSeries,
}

impl AggregationEngine {
    pub fn new(params: ModelParams) -> Result<Self> {
        params.validate()?;
        let series = SingularSeries::new(params.prime_limit, &params.conditioning);
        Ok(Self { params, series })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Aggregate pipeline records scanned with radius `radius`.
    pub fn aggregate(&self, records: &[StarRecord], radius: u64) -> Result<Report> {
        check_radius(radius)?;
        let population = Population::from_records(records, radius)?;
        if !population.incomplete.is_empty() {
            log::warn!(
                "{} stars have incomplete scans and are excluded",
                population.incomplete.len()
            );
        }
        self.reduce(&population, radius)
    }

    /// Aggregate a catalog of (n, k) pairs for the family with `exponent`.
    pub fn aggregate_catalog(&self, pairs: &[(BigUint, u64)], radius: u64, exponent: u32) -> Result<Report> {
        check_radius(radius)?;
        let population = Population::from_catalog(pairs, radius, exponent)?;
        self.reduce(&population, radius)
    }

    pub fn reduce(&self, population: &Population, radius: u64) -> Result<Report> {
        if population.samples.is_empty() {
            return Err(StatsError::NoStars);
        }
        let table = self.series.table(radius);
        let weight = population.inverse_ln_sum();
        let stars = population.star_count();
        let per_star = weight / stars as f64;

        let poisson = poisson::fit(&population.counts(), self.params.poisson_max_count);
        let gap_rows = gaps::gap_table(population.gaps(), &table, weight);
        let residue_classes = gaps::residue_classes(&gap_rows);
        let chi2_hardy_littlewood = gaps::chi2_against_model(&gap_rows, self.params.chi2_min_expected);
        let uniformity = gaps::uniformity(population.gaps(), radius, self.params.uniformity_bins);
        let mod30 = gaps::mod30_table(population.gaps(), &self.params.conditioning);
        let nearest = nearest::compare_nearest(population, &table, &self.params.cdf_thresholds);
        let density = nearest::density_bands(population, radius, self.params.density_bands);

        let report = Report {
            radius,
            stars,
            inferred_zero: population.inferred_zero,
            incomplete: population.incomplete.clone(),
            total_satellites: population.satellite_count(),
            mean_satellites: poisson.lambda,
            dispersion_index: poisson.dispersion_index,
            mean_ln_p: population.mean_ln_p(),
            cramer_mean: radius as f64 * per_star,
            hardy_littlewood_mean: table.iter().sum::<f64>() * per_star,
            poisson,
            gaps: gap_rows,
            residue_classes,
            chi2_hardy_littlewood,
            uniformity,
            mod30,
            nearest,
            density,
        };
        log::info!(
            "Aggregated {} stars: mean {:.3} satellites (Cramér {:.3}, HL {:.3}), dispersion {:.3}, χ² p={:.4}",
            report.stars,
            report.mean_satellites,
            report.cramer_mean,
            report.hardy_littlewood_mean,
            report.dispersion_index,
            report.chi2_hardy_littlewood.p_value
        );
        Ok(report)
    }
}

fn check_radius(radius: u64) -> Result<()> {
    if radius < 2 {
        return Err(StatsError::RadiusTooSmall(radius));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape_core::{Family, MainStar, PowerDifference, Satellite};

    fn record(n: u64, gaps: &[u64]) -> StarRecord {
        let family = PowerDifference::default();
        let n = BigUint::from(n);
        let value = family.value(&n).unwrap();
        let satellites = gaps
            .iter()
            .map(|&k| Satellite {
                n: n.clone(),
                k,
                value: &value - k,
            })
            .collect();
        StarRecord::complete(MainStar::new(n, value), satellites)
    }

    fn small_run() -> Vec<StarRecord> {
        // Synthetic census: 9 stars, 9 satellites, three stars without any.
        vec![
            record(13, &[36, 60]),
            record(42, &[]),
            record(66, &[2, 114]),
            record(71, &[12, 158]),
            record(87, &[194]),
            record(149, &[134]),
            record(164, &[80]),
            record(171, &[]),
            record(198, &[]),
        ]
    }

    #[test]
    fn test_counts_are_consistent() {
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        let report = engine.aggregate(&small_run(), 200).unwrap();
        assert_eq!(report.stars, 9);
        assert_eq!(report.total_satellites, 9);
        assert!((report.mean_satellites - 1.0).abs() < 1e-12);
        assert_eq!(report.gaps.iter().map(|g| g.observed).sum::<usize>(), 9);
        assert_eq!(
            report.residue_classes.observed_class0 + report.residue_classes.observed_class2,
            9
        );
        assert_eq!(report.poisson.rows.iter().map(|r| r.observed).sum::<usize>(), 9);
        assert_eq!(report.nearest.stars, 6);
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn test_model_means() {
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        let report = engine.aggregate(&small_run(), 200).unwrap();
        // P has 50 to 110 digits here
        assert!(report.cramer_mean > 0.5 && report.cramer_mean < 2.0);
        let ratio = report.hardy_littlewood_mean / report.cramer_mean;
        assert!((ratio - 1.0).abs() < 0.1, "ratio={}", ratio);
        let expected: f64 = report.gaps.iter().map(|g| g.expected).sum();
        assert!((expected / report.stars as f64 - report.hardy_littlewood_mean).abs() < 1e-9);
    }

    #[test]
    fn test_incomplete_stars_excluded() {
        let family = PowerDifference::default();
        let mut records = small_run();
        let n = BigUint::from(280u32);
        records.push(StarRecord::failed(
            MainStar::new(n.clone(), family.value(&n).unwrap()),
            "oracle inconclusive",
        ));
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        let report = engine.aggregate(&records, 200).unwrap();
        assert_eq!(report.stars, 9);
        assert_eq!(report.incomplete, vec![n]);
    }

    #[test]
    fn test_order_does_not_matter() {
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        let mut reversed = small_run();
        reversed.reverse();
        assert_eq!(
            engine.aggregate(&small_run(), 200).unwrap(),
            engine.aggregate(&reversed, 200).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        assert_eq!(engine.aggregate(&[], 200), Err(StatsError::NoStars));
        assert_eq!(engine.aggregate(&small_run(), 1), Err(StatsError::RadiusTooSmall(1)));
        assert!(matches!(
            engine.aggregate(&small_run(), 100),
            Err(StatsError::GapOutOfWindow { radius: 100, .. })
        ));
    }

    #[test]
    fn test_catalog_aggregation() {
        let engine = AggregationEngine::new(ModelParams::default()).unwrap();
        let pairs: Vec<(BigUint, u64)> = [(100_000_000_000u64, 2u64), (100_000_000_000, 1200), (100_000_000_007, 36)]
            .iter()
            .map(|&(n, k)| (BigUint::from(n), k))
            .collect();
        let report = engine.aggregate_catalog(&pairs, 5000, 47).unwrap();
        assert_eq!(report.total_satellites, 3);
        assert_eq!(report.stars, 2 + report.inferred_zero);
        assert_eq!(report.poisson.rows[0].observed, report.inferred_zero);
    }
}
