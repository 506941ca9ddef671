//! Tensor fixtures.

use tritium_arena::Pool;
use tritium_core::Trit;
use tritium_tensor::Tensor;

/// A 1 MiB pool with default alignment.
pub fn scratch_pool() -> Pool {
    Pool::with_capacity(1 << 20).expect("scratch pool")
}

/// Allocate a tensor of shape `dims` and fill it.
///
/// # Panics
///
/// Panics if allocation or the fill fails.
pub fn tensor_from<'p>(
    pool: &'p Pool,
    dims: &[usize],
    values: &[Trit],
    confidences: &[f64],
) -> Tensor<'p> {
    let mut t = Tensor::new(pool, dims).expect("fixture tensor allocation");
    t.fill(values, confidences).expect("fixture tensor fill");
    t
}

/// Parse a compact trit string: `T`, `F` and `?` (whitespace ignored).
///
/// # Panics
///
/// Panics on any other character.
pub fn trits(s: &str) -> Vec<Trit> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'T' => Trit::True,
            'F' => Trit::False,
            '?' => Trit::Unknown,
            other => panic!("not a trit: {other:?}"),
        })
        .collect()
}

/// Assert two slices agree elementwise within `tol`.
#[track_caller]
pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch: {actual:?} vs {expected:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol,
            "element {i}: {a} differs from {e} by more than {tol}\n  actual:   {actual:?}\n  expected: {expected:?}"
        );
    }
}
