//! Strong Lucas probable-prime test with Selfridge parameters.
//!
//! Together with a base-2 strong Miller-Rabin test this forms the Baillie-PSW
//! test; no composite passing both is known.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// How many Selfridge candidates D = 5, -7, 9, ... are tried before giving up.
const SELFRIDGE_SEARCH_LIMIT: u64 = 10_000;

/// Outcome of a Lucas test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LucasVerdict {
    ProbablePrime,
    Composite,
    /// No parameter D with (D/n) = -1 was found within the search limit.
    Inconclusive,
}

/// Jacobi symbol (a/n) for odd n > 0.
pub fn jacobi(a: &BigUint, n: &BigUint) -> i32 {
    debug_assert!(n.is_odd());
    let mut a = a % n;
    let mut n = n.clone();
    let mut result = 1i32;

    while !a.is_zero() {
        // Extract factors of 2
        while a.is_even() {
            a >>= 1u32;
            let n_mod8 = low_bits(&n) & 7;
            if n_mod8 == 3 || n_mod8 == 5 {
                result = -result;
            }
        }
        // Quadratic reciprocity
        std::mem::swap(&mut a, &mut n);
        if low_bits(&a) & 3 == 3 && low_bits(&n) & 3 == 3 {
            result = -result;
        }
        a %= &n;
    }

    if n.is_one() {
        result
    } else {
        0
    }
}

fn low_bits(x: &BigUint) -> u32 {
    x.iter_u32_digits().next().unwrap_or(0)
}

/// True when `n` is a perfect square.
pub fn is_perfect_square(n: &BigUint) -> bool {
    let root = n.sqrt();
    &root * &root == *n
}

/// Selfridge's method A: first D in 5, -7, 9, -11, ... with (D/n) = -1.
///
/// Returns the signed D, `Err(divisor)` if some |D| shares a factor with n,
/// or `None` if the search limit is exhausted.
fn selfridge_d(n: &BigUint) -> Option<Result<i64, u64>> {
    let mut abs_d = 5u64;
    let mut negative = false;
    while abs_d < SELFRIDGE_SEARCH_LIMIT {
        let d_mod_n = signed_mod(abs_d, negative, n);
        match jacobi(&d_mod_n, n) {
            -1 => {
                let d = abs_d as i64;
                return Some(Ok(if negative { -d } else { d }));
            }
            0 => {
                // gcd(|D|, n) > 1: composite unless n is |D| itself
                if BigUint::from(abs_d) != *n {
                    return Some(Err(abs_d));
                }
            }
            _ => {}
        }
        abs_d += 2;
        negative = !negative;
    }
    None
}

/// The residue of ±`abs` modulo `n`.
fn signed_mod(abs: u64, negative: bool, n: &BigUint) -> BigUint {
    let r = BigUint::from(abs) % n;
    if negative && !r.is_zero() {
        n - r
    } else {
        r
    }
}

/// (a - b) mod n for a, b already reduced.
fn sub_mod(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        n - (b - a)
    }
}

/// x / 2 mod n for odd n.
fn half_mod(x: BigUint, n: &BigUint) -> BigUint {
    let x = x % n;
    if x.is_even() {
        x >> 1u32
    } else {
        (x + n) >> 1u32
    }
}

/// Strong Lucas probable-prime test on an odd n > 2.
pub fn strong_lucas_test(n: &BigUint) -> LucasVerdict {
    debug_assert!(n.is_odd());
    if is_perfect_square(n) {
        return LucasVerdict::Composite;
    }

    let d = match selfridge_d(n) {
        Some(Ok(d)) => d,
        Some(Err(_)) => return LucasVerdict::Composite,
        None => return LucasVerdict::Inconclusive,
    };

    // P = 1, Q = (1 - D) / 4
    let q_signed = (1 - d) / 4;
    let q = signed_mod(q_signed.unsigned_abs(), q_signed < 0, n);
    let d_mod = signed_mod(d.unsigned_abs(), d < 0, n);

    // n + 1 = m * 2^s with m odd
    let n_plus_1 = n + BigUint::one();
    let s = n_plus_1.trailing_zeros().unwrap_or(0);
    let m = &n_plus_1 >> s;

    // Walk the bits of m from the top, tracking (U_k, V_k, Q^k) with k = 1
    let mut u = BigUint::one();
    let mut v = BigUint::one();
    let mut qk = q.clone();
    let bits = m.bits();
    for i in (0..bits - 1).rev() {
        // Double: k -> 2k
        u = (&u * &v) % n;
        let two_qk = (&qk << 1u32) % n;
        v = sub_mod(&((&v * &v) % n), &two_qk, n);
        qk = (&qk * &qk) % n;

        if m.bit(i) {
            // Increment: 2k -> 2k + 1
            let next_u = half_mod(&u + &v, n);
            let next_v = half_mod((&d_mod * &u) % n + &v, n);
            u = next_u;
            v = next_v;
            qk = (&qk * &q) % n;
        }
    }

    if u.is_zero() || v.is_zero() {
        return LucasVerdict::ProbablePrime;
    }

    for _ in 1..s {
        let two_qk = (&qk << 1u32) % n;
        v = sub_mod(&((&v * &v) % n), &two_qk, n);
        if v.is_zero() {
            return LucasVerdict::ProbablePrime;
        }
        qk = (&qk * &qk) % n;
    }

    LucasVerdict::Composite
}
