//! Small-prime tables and trial-division pre-filters.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

/// Trial-division base used by [`quick_reject`]: every prime below this bound.
pub const QUICK_REJECT_BOUND: u64 = 2000;

/// Generate all primes up to `limit` using the Sieve of Eratosthenes.
pub fn sieve_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let size = (limit + 1) as usize;
    let mut is_prime = vec![true; size];
    is_prime[0] = false;
    is_prime[1] = false;
    let mut i = 2usize;
    while i * i < size {
        if is_prime[i] {
            let mut j = i * i;
            while j < size {
                is_prime[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    is_prime
        .iter()
        .enumerate()
        .filter(|(_, &p)| p)
        .map(|(i, _)| i as u64)
        .collect()
}

/// The primes below [`QUICK_REJECT_BOUND`], computed once.
pub fn small_primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| sieve_primes(QUICK_REJECT_BOUND - 1))
}

/// Residue of a big integer modulo a word-sized modulus.
pub fn residue(x: &BigUint, m: u64) -> u64 {
    (x % m).to_u64().unwrap_or(0)
}

/// Trial division by the fixed small-prime base.
///
/// Returns true when `x` has a small prime factor and is not that prime itself,
/// i.e. `x` is certainly composite. Never rejects a prime: the full oracle
/// stays authoritative for everything that survives.
pub fn quick_reject(x: &BigUint) -> bool {
    small_factor(x, small_primes()).is_some()
}

/// The first prime in `primes` that properly divides `x`.
pub fn small_factor(x: &BigUint, primes: &[u64]) -> Option<u64> {
    let small = x.to_u64();
    primes.iter().copied().find(|&p| {
        if small == Some(p) {
            return false;
        }
        residue(x, p) == 0
    })
}

/// Outcome of a bounded trial division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialVerdict {
    /// A proper factor at most the bound was found.
    Composite(u64),
    /// No factor up to sqrt(x): x is prime.
    Prime,
    /// No factor up to the bound, but the bound is below sqrt(x).
    Undecided,
}

/// Trial division of `x` by every odd number up to `bound`.
///
/// Used as the deterministic fallback when the probabilistic test cannot
/// reach a verdict.
pub fn trial_division(x: &BigUint, bound: u64) -> TrialVerdict {
    if x < &BigUint::from(2u32) {
        return TrialVerdict::Composite(1);
    }
    if x.is_even() {
        return if *x == BigUint::from(2u32) {
            TrialVerdict::Prime
        } else {
            TrialVerdict::Composite(2)
        };
    }

    let root = num_integer::Roots::sqrt(x);
    let limit = match root.to_u64() {
        Some(r) if r <= bound => r,
        _ => bound,
    };

    let mut divisor = 3u64;
    while divisor <= limit {
        if (x % divisor).is_zero() {
            return TrialVerdict::Composite(divisor);
        }
        divisor += 2;
    }

    if root.to_u64().map_or(false, |r| r <= bound) {
        TrialVerdict::Prime
    } else {
        TrialVerdict::Undecided
    }
}
