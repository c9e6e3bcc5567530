//! Gap histogram against the conditional Hardy–Littlewood prediction, and
//! the residue and uniformity tables built on it.

use std::collections::BTreeMap;

use serde::Serialize;

use landscape_core::FixedResidue;

use crate::special::chi2_sf;

/// Observed and expected satellite counts at one gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapStatistics {
    pub k: u64,
    /// k mod 6.
    pub class: u64,
    pub observed: usize,
    pub expected: f64,
    /// (observed - expected) / sqrt(expected); 0 where nothing is expected.
    pub sigma: f64,
}

/// Rows for every k the model admits plus any k where satellites were seen.
///
/// `table[k - 1]` is S_cond(k); the expected count at k is
/// S_cond(k) · Σ_stars 1/ln P.
pub fn gap_table(gaps: impl Iterator<Item = u64>, table: &[f64], inverse_ln_sum: f64) -> Vec<GapStatistics> {
    let mut observed: BTreeMap<u64, usize> = BTreeMap::new();
    for k in gaps {
        *observed.entry(k).or_default() += 1;
    }

    let radius = table.len() as u64;
    (2..=radius)
        .step_by(2)
        .filter_map(|k| {
            let s_cond = table[(k - 1) as usize];
            let seen = observed.get(&k).copied().unwrap_or(0);
            if s_cond <= 0.0 && seen == 0 {
                return None;
            }
            let expected = s_cond * inverse_ln_sum;
            let sigma = if expected > 0.0 {
                (seen as f64 - expected) / expected.sqrt()
            } else {
                0.0
            };
            Some(GapStatistics {
                k,
                class: k % 6,
                observed: seen,
                expected,
                sigma,
            })
        })
        .collect()
}

/// Totals for the two admissible classes k ≡ 0 and k ≡ 2 (mod 6).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidueClasses {
    pub observed_class0: usize,
    pub observed_class2: usize,
    /// Satellites at k ≡ 4 (mod 6); zero whenever P ≡ 1 (mod 3).
    pub observed_other: usize,
    pub expected_class0: f64,
    pub expected_class2: f64,
    /// class 2 / class 0.
    pub observed_ratio: f64,
    pub expected_ratio: f64,
}

pub fn residue_classes(rows: &[GapStatistics]) -> ResidueClasses {
    let mut classes = ResidueClasses {
        observed_class0: 0,
        observed_class2: 0,
        observed_other: 0,
        expected_class0: 0.0,
        expected_class2: 0.0,
        observed_ratio: 0.0,
        expected_ratio: 0.0,
    };
    for row in rows {
        match row.class {
            0 => {
                classes.observed_class0 += row.observed;
                classes.expected_class0 += row.expected;
            }
            2 => {
                classes.observed_class2 += row.observed;
                classes.expected_class2 += row.expected;
            }
            _ => classes.observed_other += row.observed,
        }
    }
    if classes.observed_class0 > 0 {
        classes.observed_ratio = classes.observed_class2 as f64 / classes.observed_class0 as f64;
    }
    if classes.expected_class0 > 0.0 {
        classes.expected_ratio = classes.expected_class2 / classes.expected_class0;
    }
    classes
}

/// Outcome of a χ² goodness-of-fit test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
    pub bins: usize,
}

impl ChiSquare {
    fn degenerate(bins: usize) -> Self {
        ChiSquare {
            statistic: 0.0,
            df: 0,
            p_value: 1.0,
            bins,
        }
    }

    fn from_bins(bins: &[(f64, f64)]) -> Self {
        if bins.len() < 2 {
            return Self::degenerate(bins.len());
        }
        let statistic = bins
            .iter()
            .filter(|(_, e)| *e > 0.0)
            .map(|(o, e)| (o - e).powi(2) / e)
            .sum::<f64>();
        let df = bins.len() - 1;
        ChiSquare {
            statistic,
            df,
            p_value: chi2_sf(statistic, df),
            bins: bins.len(),
        }
    }
}

/// χ² of the observed gap histogram against the model's shape.
///
/// Expected counts are scaled to the observed total, then consecutive gaps
/// are pooled until every bin expects at least `min_expected`.
pub fn chi2_against_model(rows: &[GapStatistics], min_expected: f64) -> ChiSquare {
    let modelled: Vec<&GapStatistics> = rows.iter().filter(|r| r.expected > 0.0).collect();
    let observed_total: usize = modelled.iter().map(|r| r.observed).sum();
    let expected_total: f64 = modelled.iter().map(|r| r.expected).sum();
    if observed_total == 0 || expected_total <= 0.0 {
        return ChiSquare::degenerate(0);
    }
    let scale = observed_total as f64 / expected_total;

    let mut bins: Vec<(f64, f64)> = Vec::new();
    let mut pending = (0.0, 0.0);
    for row in modelled {
        pending.0 += row.observed as f64;
        pending.1 += row.expected * scale;
        if pending.1 >= min_expected {
            bins.push(pending);
            pending = (0.0, 0.0);
        }
    }
    if pending.1 > 0.0 {
        match bins.last_mut() {
            Some(last) => {
                last.0 += pending.0;
                last.1 += pending.1;
            }
            None => bins.push(pending),
        }
    }
    ChiSquare::from_bins(&bins)
}

/// χ² of gap positions against a uniform spread over `bins` equal-width
/// bins of (0, radius].
pub fn uniformity(gaps: impl Iterator<Item = u64>, radius: u64, bins: usize) -> ChiSquare {
    let mut histogram = vec![0usize; bins];
    for k in gaps {
        let bin = ((k as u128 * bins as u128) / radius as u128) as usize;
        histogram[bin.min(bins - 1)] += 1;
    }
    let total: usize = histogram.iter().sum();
    if total == 0 {
        return ChiSquare::degenerate(bins);
    }
    let expected = total as f64 / bins as f64;
    let pairs: Vec<(f64, f64)> = histogram.iter().map(|&o| (o as f64, expected)).collect();
    ChiSquare::from_bins(&pairs)
}

/// Satellite count for one residue of k mod 30.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mod30Row {
    pub residue: u64,
    /// residue mod 6.
    pub class: u64,
    pub count: usize,
    pub fraction: f64,
    /// Whether the conditioning residues allow this class at all.
    pub admissible: bool,
}

/// Residues mod 30 that are admissible or were observed.
pub fn mod30_table(gaps: impl Iterator<Item = u64>, conditioning: &[FixedResidue]) -> Vec<Mod30Row> {
    let mut counts = [0usize; 30];
    for k in gaps {
        counts[(k % 30) as usize] += 1;
    }
    let total: usize = counts.iter().sum();

    (0u64..30)
        .filter_map(|residue| {
            let admissible = residue % 2 == 0
                && conditioning
                    .iter()
                    .filter(|f| 30 % f.prime == 0)
                    .all(|f| residue % f.prime != f.residue % f.prime);
            let count = counts[residue as usize];
            if !admissible && count == 0 {
                return None;
            }
            Some(Mod30Row {
                residue,
                class: residue % 6,
                count,
                fraction: if total > 0 { count as f64 / total as f64 } else { 0.0 },
                admissible,
            })
        })
        .collect()
}
