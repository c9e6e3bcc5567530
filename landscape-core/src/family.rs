//! Candidate families: Q(n) = n^e - (n-1)^e and the residue structure it implies.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{LandscapeError, Result};
use crate::sieve::{self, residue};

/// Primes tried for fixed residues when building a family.
pub const RESIDUE_SCAN_LIMIT: u64 = 100;

/// A residue that Q(n) takes modulo `prime` for every n.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedResidue {
    pub prime: u64,
    pub residue: u64,
}

/// A family of candidate main stars indexed by n >= 1.
pub trait Family: Send + Sync {
    /// Short label for logs and reports.
    fn name(&self) -> String;

    /// Exact value Q(n). Fails for n = 0.
    fn value(&self, n: &BigUint) -> Result<BigUint>;

    /// Q(n) mod p for a word-sized n residue; used to find fixed residues.
    fn value_mod(&self, n_mod_p: u64, p: u64) -> u64;

    /// Residues shared by every member of the family.
    fn fixed_residues(&self) -> &[FixedResidue];

    /// Gap admissibility predicate derived from the fixed residues.
    fn admissibility(&self) -> Admissibility {
        Admissibility::new(self.fixed_residues().to_vec())
    }
}

/// Q(n) = n^e - (n-1)^e.
#[derive(Debug, Clone)]
pub struct PowerDifference {
    exponent: u32,
    fixed: Vec<FixedResidue>,
}

impl PowerDifference {
    pub const DEFAULT_EXPONENT: u32 = 47;

    pub fn new(exponent: u32) -> Result<Self> {
        if exponent < 2 {
            return Err(LandscapeError::InvalidExponent(exponent));
        }
        Ok(Self::build(exponent))
    }

    fn build(exponent: u32) -> Self {
        let mut family = Self {
            exponent,
            fixed: Vec::new(),
        };
        family.fixed = find_fixed_residues(&family, RESIDUE_SCAN_LIMIT);
        family
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }
}

impl Default for PowerDifference {
    fn default() -> Self {
        Self::build(Self::DEFAULT_EXPONENT)
    }
}

impl Family for PowerDifference {
    fn name(&self) -> String {
        format!("n^{} - (n-1)^{}", self.exponent, self.exponent)
    }

    fn value(&self, n: &BigUint) -> Result<BigUint> {
        if n.is_zero() {
            return Err(LandscapeError::IndexOutOfDomain(n.to_string()));
        }
        let n_minus_1 = n - BigUint::one();
        Ok(n.pow(self.exponent) - n_minus_1.pow(self.exponent))
    }

    fn value_mod(&self, n_mod_p: u64, p: u64) -> u64 {
        let e = self.exponent as u64;
        let n = n_mod_p % p;
        let prev = (n + p - 1) % p;
        (mod_pow(n, e, p) + p - mod_pow(prev, e, p)) % p
    }

    fn fixed_residues(&self) -> &[FixedResidue] {
        &self.fixed
    }
}

/// Modular exponentiation: base^exp mod m using binary method.
pub fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u128;
    let m = m as u128;
    base %= m as u64;
    let mut b = base as u128;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % m;
        }
        exp >>= 1;
        b = b * b % m;
    }
    result as u64
}

/// Every prime p <= `limit` for which Q(n) mod p does not depend on n.
///
/// Q is a polynomial in n, so Q(n) mod p depends only on n mod p and
/// checking one full residue system is exact.
pub fn find_fixed_residues(family: &dyn Family, limit: u64) -> Vec<FixedResidue> {
    sieve::sieve_primes(limit)
        .into_iter()
        .filter_map(|p| {
            let first = family.value_mod(0, p);
            (1..p)
                .all(|n| family.value_mod(n, p) == first)
                .then_some(FixedResidue {
                    prime: p,
                    residue: first,
                })
        })
        .collect()
}

/// Gap admissibility: k is admissible when P - k avoids every residue class
/// that the family forces to be divisible by a fixed prime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admissibility {
    fixed: Vec<FixedResidue>,
}

impl Admissibility {
    pub fn new(fixed: Vec<FixedResidue>) -> Self {
        Self { fixed }
    }

    /// A rule that admits every gap.
    pub fn permissive() -> Self {
        Self { fixed: Vec::new() }
    }

    pub fn residues(&self) -> &[FixedResidue] {
        &self.fixed
    }

    /// True if P - k is not forced to be divisible by any fixed prime.
    pub fn admits(&self, k: u64) -> bool {
        self.fixed
            .iter()
            .all(|f| k % f.prime != f.residue % f.prime)
    }

    /// True if `value` actually has every fixed residue.
    pub fn holds_for(&self, value: &BigUint) -> bool {
        self.fixed
            .iter()
            .all(|f| residue(value, f.prime) == f.residue)
    }

    /// Largest fixed prime; candidates at or below it may equal that prime.
    pub fn largest_prime(&self) -> u64 {
        self.fixed.iter().map(|f| f.prime).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_traits::Signed;

    /// Q(n) via the binomial expansion sum_{i<e} C(e,i) n^i (-1)^(e-1-i).
    fn binomial_expansion(n: u64, e: u32) -> BigUint {
        let n = BigInt::from(n);
        let mut total = BigInt::zero();
        let mut binom = BigInt::one();
        for i in 0..e {
            let term = &binom * n.pow(i);
            if (e - 1 - i) % 2 == 0 {
                total += term;
            } else {
                total -= term;
            }
            binom = binom * BigInt::from(e - i) / BigInt::from(i + 1);
        }
        assert!(!total.is_negative());
        total.to_biguint().unwrap()
    }

    #[test]
    fn test_value_matches_binomial_expansion() {
        let family = PowerDifference::default();
        for n in [1u64, 2, 3, 10, 117_309_848, 41_262_186_068, 29_707_259_863] {
            let direct = family.value(&BigUint::from(n)).unwrap();
            assert_eq!(direct, binomial_expansion(n, 47), "Q({}) mismatch", n);
        }
    }

    #[test]
    fn test_value_small_cases() {
        let family = PowerDifference::default();
        assert_eq!(family.value(&BigUint::one()).unwrap(), BigUint::one());
        let q2 = (BigUint::one() << 47u32) - BigUint::one();
        assert_eq!(family.value(&BigUint::from(2u32)).unwrap(), q2);
    }

    #[test]
    fn test_zero_index_rejected() {
        let family = PowerDifference::default();
        assert_eq!(
            family.value(&BigUint::zero()),
            Err(LandscapeError::IndexOutOfDomain("0".into()))
        );
    }

    #[test]
    fn test_invalid_exponent() {
        assert!(PowerDifference::new(1).is_err());
        assert!(PowerDifference::new(2).is_ok());
    }

    #[test]
    fn test_fixed_residues_exponent_47() {
        let family = PowerDifference::default();
        let primes: Vec<u64> = family.fixed_residues().iter().map(|f| f.prime).collect();
        assert_eq!(primes, vec![2, 3, 47]);
        assert!(family.fixed_residues().iter().all(|f| f.residue == 1));
    }

    #[test]
    fn test_value_mod_agrees_with_exact_value() {
        let family = PowerDifference::default();
        for n in 1u64..40 {
            let exact = family.value(&BigUint::from(n)).unwrap();
            for p in [5u64, 7, 11, 47, 97] {
                assert_eq!(family.value_mod(n % p, p), residue(&exact, p));
            }
        }
    }

    #[test]
    fn test_admissibility_mod_6() {
        let rule = PowerDifference::default().admissibility();
        for k in 1u64..200 {
            let mod6_ok = k % 2 == 0 && (k % 6 == 0 || k % 6 == 2);
            let mod47_ok = k % 47 != 1;
            assert_eq!(rule.admits(k), mod6_ok && mod47_ok, "k = {}", k);
        }
        assert!(Admissibility::permissive().admits(3));
    }

    #[test]
    fn test_holds_for_every_member() {
        let family = PowerDifference::default();
        let rule = family.admissibility();
        for n in 1u64..60 {
            let q = family.value(&BigUint::from(n)).unwrap();
            assert!(rule.holds_for(&q), "Q({}) breaks a fixed residue", n);
            assert_eq!(residue(&q, 6), 1);
        }
    }

    #[test]
    fn test_square_exponent_has_no_mod_3_structure() {
        // n^2 - (n-1)^2 = 2n - 1 is odd but takes every residue mod 3
        let family = PowerDifference::new(2).unwrap();
        let primes: Vec<u64> = family.fixed_residues().iter().map(|f| f.prime).collect();
        assert_eq!(primes, vec![2]);
    }
}
