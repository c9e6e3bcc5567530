//! Per-star satellite counts against a Poisson law.

use serde::Serialize;

use crate::special::ln_gamma;

/// Observed vs expected number of stars with exactly `count` satellites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoissonRow {
    pub count: usize,
    pub observed: usize,
    pub expected: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoissonFit {
    pub stars: usize,
    pub lambda: f64,
    pub variance: f64,
    /// variance / mean; 1 for a Poisson law.
    pub dispersion_index: f64,
    pub rows: Vec<PoissonRow>,
}

/// Number of stars without satellites implied by `stars_with` stars that
/// have at least one, holding `satellites` in total.
///
/// N_true = round(N_with / (1 - e^{-λ})), λ the mean over `stars_with`.
pub fn recover_zero_count(stars_with: usize, satellites: usize) -> usize {
    if stars_with == 0 {
        return 0;
    }
    let lambda = satellites as f64 / stars_with as f64;
    let detect = 1.0 - (-lambda).exp();
    if detect <= 0.0 {
        return 0;
    }
    let total = (stars_with as f64 / detect).round() as usize;
    total.saturating_sub(stars_with)
}

pub fn poisson_pmf(lambda: f64, count: usize) -> f64 {
    if lambda <= 0.0 {
        return if count == 0 { 1.0 } else { 0.0 };
    }
    let c = count as f64;
    (c * lambda.ln() - lambda - ln_gamma(c + 1.0)).exp()
}

/// Fit λ = mean count and tabulate counts 0..=max(max_count, largest seen).
pub fn fit(counts: &[usize], max_count: usize) -> PoissonFit {
    let stars = counts.len();
    if stars == 0 {
        return PoissonFit {
            stars: 0,
            lambda: 0.0,
            variance: 0.0,
            dispersion_index: 0.0,
            rows: Vec::new(),
        };
    }

    let n = stars as f64;
    let lambda = counts.iter().sum::<usize>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - lambda).powi(2))
        .sum::<f64>()
        / n;
    let dispersion_index = if lambda > 0.0 { variance / lambda } else { 0.0 };

    let largest = counts.iter().copied().max().unwrap_or(0).max(max_count);
    let mut histogram = vec![0usize; largest + 1];
    for &c in counts {
        histogram[c] += 1;
    }
    let rows = histogram
        .into_iter()
        .enumerate()
        .map(|(count, observed)| {
            let expected = n * poisson_pmf(lambda, count);
            PoissonRow {
                count,
                observed,
                expected,
                ratio: if expected > 0.0 { observed as f64 / expected } else { 0.0 },
            }
        })
        .collect();

    PoissonFit {
        stars,
        lambda,
        variance,
        dispersion_index,
        rows,
    }
}
