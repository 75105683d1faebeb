//! Counting functions used by the calculator's scientific keys.
//!
//! All results are `f64`, matching the evaluator's number type: large inputs
//! overflow to infinity rather than wrapping.

use crate::errors::NumericError;

/// Largest `n` whose factorial is finite as an `f64`.
pub const MAX_FINITE_FACTORIAL: i64 = 170;

/// `n!` for non-negative `n`.
///
/// # Errors
/// Returns `NumericError::NegativeFactorialInput` for negative `n`.
///
/// # Example
/// ```
/// use calcexpr::operators::combinatorics::factorial;
///
/// assert_eq!(factorial(5).unwrap(), 120.0);
/// assert!(factorial(-1).is_err());
/// ```
pub fn factorial(n: i64) -> Result<f64, NumericError> {
    if n < 0 {
        return Err(NumericError::NegativeFactorialInput(n));
    }
    if n > MAX_FINITE_FACTORIAL {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n).fold(1.0, |acc, i| acc * i as f64))
}

/// Number of ways to choose `k` items out of `n`, ignoring order.
///
/// Zero when `k` is outside `0..=n`. Computed with the multiplicative formula
/// over `min(k, n - k)` terms and rounded to absorb floating-point drift.
pub fn combination(n: i64, k: i64) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    if k == 0 || k == n {
        return 1.0;
    }
    let k = k.min(n - k);
    let mut result: f64 = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
        // Partial products only grow while i < n / 2
        if result.is_infinite() {
            return f64::INFINITY;
        }
    }
    result.round()
}

/// Number of ordered arrangements of `k` items out of `n`.
///
/// Zero when `k` is outside `0..=n`.
pub fn permutation(n: i64, k: i64) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    // A product of k distinct positive integers is at least k!
    if k > MAX_FINITE_FACTORIAL {
        return f64::INFINITY;
    }
    ((n - k + 1)..=n).fold(1.0, |acc, i| acc * i as f64)
}
