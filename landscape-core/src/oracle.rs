//! Primality oracle for arbitrary-precision integers.
//!
//! Small inputs (below 3.3e24) get a deterministic Miller-Rabin verdict.
//! Larger inputs get Baillie-PSW plus extra Miller-Rabin rounds whose bases
//! are derived from the candidate itself, so every verdict is a pure function
//! of the input and the configuration.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{LandscapeError, Result};
use crate::lucas::{strong_lucas_test, LucasVerdict};
use crate::sieve::{self, TrialVerdict};

/// First 13 primes: a deterministic Miller-Rabin base set for n < 3.3e24.
const DETERMINISTIC_BASES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// 3 317 044 064 679 887 385 961 981: bound below which the bases above are exact.
const DETERMINISTIC_LIMIT: u128 = 3_317_044_064_679_887_385_961_981;

/// Oracle configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Extra random-base Miller-Rabin rounds on top of Baillie-PSW.
    pub rounds: u32,
    /// Trial-division bound used when the Lucas step is inconclusive.
    pub fallback_bound: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            rounds: 25,
            fallback_bound: 10_000_000,
        }
    }
}

/// Probabilistic primality oracle. Stateless apart from its configuration,
/// so a single instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct PrimalityOracle {
    config: OracleConfig,
}

impl PrimalityOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// True if `x` is prime (up to a negligible error for very large `x`).
    ///
    /// An inconclusive Lucas step that the fallback cannot settle is treated
    /// as "not proven prime" and logged; use [`PrimalityOracle::check`] to
    /// handle it.
    pub fn is_probable_prime(&self, x: &BigUint) -> bool {
        settle(self.check(x))
    }

    /// Primality verdict, surfacing the rare inconclusive case as an error.
    pub fn check(&self, x: &BigUint) -> Result<bool> {
        let two = BigUint::from(2u32);
        if *x < two {
            return Ok(false);
        }
        if *x == two {
            return Ok(true);
        }
        if x.is_even() {
            return Ok(false);
        }

        let primes = sieve::small_primes();
        if let Some(small) = x.to_u64() {
            if primes.binary_search(&small).is_ok() {
                return Ok(true);
            }
        }
        if sieve::small_factor(x, primes).is_some() {
            return Ok(false);
        }

        if let Some(small) = x.to_u128() {
            if small < DETERMINISTIC_LIMIT {
                return Ok(DETERMINISTIC_BASES
                    .iter()
                    .all(|&a| strong_probable_prime(x, &BigUint::from(a))));
            }
        }

        self.check_large(x)
    }

    fn check_large(&self, x: &BigUint) -> Result<bool> {
        if !strong_probable_prime(x, &BigUint::from(2u32)) {
            return Ok(false);
        }

        match strong_lucas_test(x) {
            LucasVerdict::Composite => return Ok(false),
            LucasVerdict::ProbablePrime => {}
            LucasVerdict::Inconclusive => {
                log::warn!(
                    "Lucas step inconclusive for a {}-bit candidate, falling back to trial division",
                    x.bits()
                );
                match sieve::trial_division(x, self.config.fallback_bound) {
                    TrialVerdict::Composite(_) => return Ok(false),
                    TrialVerdict::Prime => return Ok(true),
                    TrialVerdict::Undecided => {
                        return Err(LandscapeError::OracleInconclusive {
                            digits: crate::digit_length(x),
                        })
                    }
                }
            }
        }

        Ok(self.random_rounds(x))
    }

    /// Miller-Rabin with `rounds` bases in [2, x-2] drawn from an RNG seeded by x.
    fn random_rounds(&self, x: &BigUint) -> bool {
        let mut rng = StdRng::seed_from_u64(seed_for(x));
        let bytes = x.to_bytes_be().len();
        let x_minus_3 = x - BigUint::from(3u32);

        for _ in 0..self.config.rounds {
            let mut random_bytes = vec![0u8; bytes];
            rng.fill(&mut random_bytes[..]);
            // Map into [2, x-2]
            let a = BigUint::from_bytes_be(&random_bytes) % &x_minus_3 + BigUint::from(2u32);
            if !strong_probable_prime(x, &a) {
                return false;
            }
        }

        true
    }
}

/// Collapse a verdict to a bool; an undecided candidate is never called prime.
fn settle(verdict: Result<bool>) -> bool {
    match verdict {
        Ok(prime) => prime,
        Err(e) => {
            log::warn!("{}; reporting the candidate as not prime", e);
            false
        }
    }
}

/// Low 64 bits of the candidate mixed with its bit length.
fn seed_for(x: &BigUint) -> u64 {
    let low = x.iter_u64_digits().next().unwrap_or(0);
    low ^ x.bits().rotate_left(32)
}

/// Strong probable-prime test of odd `n` > 3 to base `a`.
pub fn strong_probable_prime(n: &BigUint, a: &BigUint) -> bool {
    let one = BigUint::one();
    let n_minus_1 = n - &one;
    let a = a % n;
    if a <= one || a == n_minus_1 {
        return true;
    }

    // Write n-1 as 2^r * d
    let r = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> r;

    let mut x = a.modpow(&d, n);
    if x == one || x == n_minus_1 {
        return true;
    }

    for _ in 1..r {
        x = (&x * &x) % n;
        if x == n_minus_1 {
            return true;
        }
        if x == one {
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> PrimalityOracle {
        PrimalityOracle::default()
    }

    #[test]
    fn test_rejects_trivial_inputs() {
        let o = oracle();
        assert!(!o.is_probable_prime(&BigUint::from(0u32)));
        assert!(!o.is_probable_prime(&BigUint::from(1u32)));
        assert!(o.is_probable_prime(&BigUint::from(2u32)));
        assert!(o.is_probable_prime(&BigUint::from(3u32)));
        assert!(!o.is_probable_prime(&BigUint::from(4u32)));
        assert!(!o.is_probable_prime(&(BigUint::one() << 600u32)));
    }

    #[test]
    fn test_agrees_with_sieve_below_100k() {
        let o = oracle();
        let limit = 100_000u64;
        let primes: std::collections::HashSet<u64> =
            sieve::sieve_primes(limit).into_iter().collect();
        for x in 0..=limit {
            assert_eq!(
                o.is_probable_prime(&BigUint::from(x)),
                primes.contains(&x),
                "disagreement at {}",
                x
            );
        }
    }

    /// Every x below 10^7; about a minute in release builds.
    #[test]
    #[ignore]
    fn test_agrees_with_sieve_below_10m() {
        let o = oracle();
        let limit = 10_000_000u64;
        let mut is_prime = vec![false; limit as usize];
        for p in sieve::sieve_primes(limit - 1) {
            is_prime[p as usize] = true;
        }
        let disagreements: Vec<u64> = (0..limit)
            .filter(|&x| o.is_probable_prime(&BigUint::from(x)) != is_prime[x as usize])
            .take(10)
            .collect();
        assert!(disagreements.is_empty(), "disagreements at {:?}", disagreements);
    }

    #[test]
    fn test_inconclusive_is_never_prime() {
        assert!(!settle(Err(LandscapeError::OracleInconclusive { digits: 500 })));
        assert!(settle(Ok(true)));
        assert!(!settle(Ok(false)));
    }

    #[test]
    fn test_agrees_with_sieve_sampled_to_10m() {
        let o = oracle();
        let limit = 10_000_000u64;
        let primes = sieve::sieve_primes(limit);
        // Every 97th prime and its odd neighbours
        for &p in primes.iter().step_by(97) {
            assert!(o.is_probable_prime(&BigUint::from(p)), "{} is prime", p);
            for x in [p + 2, p + 4] {
                assert_eq!(
                    o.is_probable_prime(&BigUint::from(x)),
                    primes.binary_search(&x).is_ok(),
                    "disagreement at {}",
                    x
                );
            }
        }
    }

    #[test]
    fn test_strong_pseudoprimes_rejected() {
        let o = oracle();
        // Strong pseudoprimes to several small bases, and Carmichael numbers
        for c in [
            2047u128,
            1_373_653,
            25_326_001,
            3_215_031_751,
            2_152_302_898_747,
            3_474_749_660_383,
            341_550_071_728_321,
            3_825_123_056_546_413_051,
            318_665_857_834_031_151_167_461,
            561,
            41041,
            825_265,
        ] {
            assert!(!o.is_probable_prime(&BigUint::from(c)), "{} is composite", c);
        }
    }

    #[test]
    fn test_large_known_primes() {
        let o = oracle();
        // Mersenne primes
        for e in [127u32, 521, 607] {
            let m = (BigUint::one() << e) - BigUint::one();
            assert!(o.is_probable_prime(&m), "2^{} - 1 is prime", e);
        }
        // 2^523 - 1 is composite
        let c = (BigUint::one() << 523u32) - BigUint::one();
        assert!(!o.is_probable_prime(&c));
    }

    #[test]
    fn test_large_semiprime_rejected() {
        let o = oracle();
        let p = (BigUint::one() << 127u32) - BigUint::one();
        let q = (BigUint::one() << 521u32) - BigUint::one();
        assert!(!o.is_probable_prime(&(&p * &q)));
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let o = oracle();
        let m = (BigUint::one() << 607u32) - BigUint::one();
        let first = o.check(&m);
        for _ in 0..3 {
            assert_eq!(o.check(&m), first);
        }
    }

    #[test]
    fn test_strong_probable_prime_base_two() {
        // 2047 = 23 * 89 fools base 2
        assert!(strong_probable_prime(&BigUint::from(2047u32), &BigUint::from(2u32)));
        assert!(!strong_probable_prime(&BigUint::from(2047u32), &BigUint::from(3u32)));
    }
}
