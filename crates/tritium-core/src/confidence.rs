//! Confidence algebra.
//!
//! Every trit carries a confidence in `[0, 1]`. Combining two trits
//! combines their confidences alongside the Kleene operation:
//!
//! | Operation | Confidence |
//! |-----------|------------|
//! | AND | `c_a * c_b` |
//! | OR | `1 - (1 - c_a) * (1 - c_b)` |
//! | multi-path | `1 - Π (1 - c_i)` |
//!
//! All functions here are pure and shape-independent.

/// Confidence of `a AND b`.
#[inline]
pub fn and(c_a: f64, c_b: f64) -> f64 {
    c_a * c_b
}

/// Confidence of `a OR b` (inclusion-exclusion).
#[inline]
pub fn or(c_a: f64, c_b: f64) -> f64 {
    1.0 - (1.0 - c_a) * (1.0 - c_b)
}

/// Aggregate confidence over independent supporting paths.
///
/// Returns `0.0` for an empty iterator. For two inputs this equals [`or`].
pub fn aggregate<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    1.0 - confidences
        .into_iter()
        .fold(1.0, |miss, c| miss * (1.0 - c))
}

/// Joint confidence of all inputs holding at once.
///
/// Returns `1.0` for an empty iterator. For two inputs this equals [`and`].
pub fn joint<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    confidences.into_iter().product()
}

/// Clamp into `[0, 1]`. NaN maps to `0.0`.
#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Whether `x` is a valid confidence (finite and within `[0, 1]`).
#[inline]
pub fn is_valid(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}
