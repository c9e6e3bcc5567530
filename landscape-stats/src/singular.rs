//! Hardy–Littlewood singular series for the pair (P - k, P), unconditional
//! and conditioned on the fixed residues of P.

use landscape_core::sieve::sieve_primes;
use landscape_core::FixedResidue;

/// Singular series S(k) with the local factors of the conditioning primes
/// replaced by their conditional versions.
#[derive(Debug, Clone)]
pub struct SingularSeries {
    primes: Vec<u64>,
    conditioning: Vec<FixedResidue>,
}

impl SingularSeries {
    pub fn new(prime_limit: u64, conditioning: &[FixedResidue]) -> Self {
        Self {
            primes: sieve_primes(prime_limit),
            conditioning: conditioning.to_vec(),
        }
    }

    /// (1 - ν/p) / (1 - 1/p)², ν = 1 if p | k else 2.
    fn local_factor(p: u64, k: u64) -> f64 {
        let p_f = p as f64;
        let nu = if k % p == 0 { 1.0 } else { 2.0 };
        (1.0 - nu / p_f) / (1.0 - 1.0 / p_f).powi(2)
    }

    /// Local factor at p given P ≡ r (mod p): P - k is coprime to p with
    /// probability p/(p-1) unless k ≡ r.
    fn conditional_factor(p: u64, residue: u64, k: u64) -> f64 {
        if k % p == residue % p {
            0.0
        } else {
            p as f64 / (p as f64 - 1.0)
        }
    }

    fn conditioning_for(&self, p: u64) -> Option<&FixedResidue> {
        self.conditioning.iter().find(|f| f.prime == p)
    }

    /// Unconditional S(k).
    pub fn unconditional(&self, k: u64) -> f64 {
        self.primes.iter().map(|&p| Self::local_factor(p, k)).product()
    }

    /// Ratio of conditional to unconditional local factors; 0 for gaps the
    /// conditioning rules out.
    pub fn bayes_factor(&self, k: u64) -> f64 {
        self.conditioning
            .iter()
            .map(|f| {
                let unconditional = Self::local_factor(f.prime, k);
                let conditional = Self::conditional_factor(f.prime, f.residue, k);
                if unconditional == 0.0 {
                    0.0
                } else {
                    conditional / unconditional
                }
            })
            .product()
    }

    /// S_cond(k) = S(k) · B(k).
    pub fn conditional(&self, k: u64) -> f64 {
        let mut product = 1.0;
        for &p in &self.primes {
            let unconditional = Self::local_factor(p, k);
            let factor = match self.conditioning_for(p) {
                Some(f) if unconditional != 0.0 => Self::conditional_factor(p, f.residue, k),
                _ => unconditional,
            };
            product *= factor;
            if product == 0.0 {
                return 0.0;
            }
        }
        // Conditioning primes beyond the product limit still contribute.
        for f in self.conditioning.iter().filter(|f| !self.primes.contains(&f.prime)) {
            product *= Self::conditional_factor(f.prime, f.residue, k);
        }
        product
    }

    /// S_cond(k) for k = 1..=radius, indexed by k - 1.
    pub fn table(&self, radius: u64) -> Vec<f64> {
        (1..=radius).map(|k| self.conditional(k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mod3() -> Vec<FixedResidue> {
        vec![FixedResidue { prime: 3, residue: 1 }]
    }

    #[test]
    fn test_odd_gaps_vanish() {
        let series = SingularSeries::new(5000, &[]);
        assert_eq!(series.unconditional(1), 0.0);
        assert_eq!(series.unconditional(7), 0.0);
    }

    #[test]
    fn test_twin_constant() {
        // S(2) = 2 C_2 = 1.3203...
        let series = SingularSeries::new(5000, &[]);
        assert!((series.unconditional(2) - 1.32032).abs() < 1e-3);
        // S(6) = 2 S(2)
        assert!((series.unconditional(6) / series.unconditional(2) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bayes_factor_mod_3() {
        let series = SingularSeries::new(5000, &mod3());
        assert!((series.bayes_factor(2) - 2.0).abs() < 1e-12);
        assert!((series.bayes_factor(6) - 1.0).abs() < 1e-12);
        assert_eq!(series.bayes_factor(4), 0.0);
        assert!((series.conditional(2) - 2.0 * series.unconditional(2)).abs() < 1e-9);
        assert!((series.conditional(12) - series.unconditional(12)).abs() < 1e-9);
        assert_eq!(series.conditional(10), 0.0);
    }

    #[test]
    fn test_conditioning_on_47() {
        let series = SingularSeries::new(
            5000,
            &[
                FixedResidue { prime: 3, residue: 1 },
                FixedResidue { prime: 47, residue: 1 },
            ],
        );
        // 48 ≡ 1 (mod 47): P - 48 is divisible by 47
        assert_eq!(series.conditional(48), 0.0);
        assert!(series.conditional(94) > 0.0);
        let table = series.table(100);
        assert_eq!(table.len(), 100);
        assert_eq!(table[47], 0.0);
        assert_eq!(table[1], series.conditional(2));
    }

    #[test]
    fn test_conditional_mean_is_near_one() {
        // Averaged over k, S_cond keeps the prime density 1/ln P.
        let series = SingularSeries::new(5000, &mod3());
        let table = series.table(3000);
        let mean = table.iter().sum::<f64>() / table.len() as f64;
        assert!((mean - 1.0).abs() < 0.05, "mean={}", mean);
    }
}
