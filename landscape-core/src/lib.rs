//! Shared types, primality oracle and candidate family for satellite-prime searches.
//!
//! A main star is an index n for which Q(n) = n^47 - (n-1)^47 is prime; its
//! satellites are the primes P - k within a scan radius. This crate provides
//! the arbitrary-precision pieces everything else builds on.

pub mod error;
pub mod family;
pub mod lucas;
pub mod model;
pub mod oracle;
pub mod sieve;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

pub use error::{LandscapeError, Result};
pub use family::{Admissibility, Family, FixedResidue, PowerDifference};
pub use model::{canonical_order, MainStar, Satellite, ScanOutcome, StarRecord, StarSummary};
pub use oracle::{OracleConfig, PrimalityOracle};
pub use sieve::quick_reject;

/// Number of decimal digits of `x` (1 for zero).
pub fn digit_length(x: &BigUint) -> usize {
    if x.is_zero() {
        return 1;
    }
    x.to_str_radix(10).len()
}

/// Natural logarithm of a big integer, for statistics only.
///
/// Never feeds a primality decision.
pub fn ln_big(x: &BigUint) -> f64 {
    let bits = x.bits();
    if bits <= 64 {
        return x.to_f64().map_or(f64::NEG_INFINITY, f64::ln);
    }
    let shift = bits - 64;
    let top = (x >> shift).to_f64().unwrap_or(f64::MAX);
    top.ln() + shift as f64 * std::f64::consts::LN_2
}

/// Abbreviated decimal form: the first and last `edge` digits of long values.
pub fn truncated_decimal(x: &BigUint, edge: usize) -> String {
    let s = x.to_str_radix(10);
    if s.len() <= 2 * edge + 3 {
        return s;
    }
    format!("{}...{}", &s[..edge], &s[s.len() - edge..])
}
