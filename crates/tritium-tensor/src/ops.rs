//! Batched Kleene operators over whole tensors.
//!
//! Every operator checks shapes before touching memory, so an `Err`
//! return means the output is unchanged. Operators write values and
//! confidences only; the output's gradient channel is left as it was.
//!
//! The plain forms run on the process-wide [`kernels()`]; the `*_with`
//! forms take an explicit [`Kernels`] implementation.

use smallvec::SmallVec;
use tritium_core::TernaryError;

use crate::backend::{kernels, Kernels, LogicOp};
use crate::tensor::Tensor;

fn check_same_dims(op: &str, expected: &Tensor<'_>, other: &Tensor<'_>) -> Result<(), TernaryError> {
    if expected.dims() == other.dims() {
        Ok(())
    } else {
        Err(TernaryError::mismatch(format!(
            "{op}: shape {} does not match {}",
            other.shape(),
            expected.shape()
        )))
    }
}

// ── Binary ──────────────────────────────────────────────────────────

/// `out = a AND b`, elementwise, with product confidence.
///
/// # Errors
///
/// [`TernaryError::DimensionMismatch`] unless `out`, `a` and `b` have
/// identical dims.
pub fn batch_and(out: &mut Tensor<'_>, a: &Tensor<'_>, b: &Tensor<'_>) -> Result<(), TernaryError> {
    batch_and_with(kernels(), out, a, b)
}

/// `out = a OR b`, elementwise, with `1 - (1 - c_a)(1 - c_b)` confidence.
///
/// # Errors
///
/// [`TernaryError::DimensionMismatch`] unless `out`, `a` and `b` have
/// identical dims.
pub fn batch_or(out: &mut Tensor<'_>, a: &Tensor<'_>, b: &Tensor<'_>) -> Result<(), TernaryError> {
    batch_or_with(kernels(), out, a, b)
}

/// [`batch_and`] on explicit kernels.
pub fn batch_and_with(
    k: &dyn Kernels,
    out: &mut Tensor<'_>,
    a: &Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    combine(k, LogicOp::And, out, a, b)
}

/// [`batch_or`] on explicit kernels.
pub fn batch_or_with(
    k: &dyn Kernels,
    out: &mut Tensor<'_>,
    a: &Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    combine(k, LogicOp::Or, out, a, b)
}

fn combine(
    k: &dyn Kernels,
    op: LogicOp,
    out: &mut Tensor<'_>,
    a: &Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    check_same_dims(&format!("batch {op}"), out, a)?;
    check_same_dims(&format!("batch {op}"), out, b)?;
    let (a_v, a_c, _) = a.channels();
    let (b_v, b_c, _) = b.channels();
    let (out_v, out_c, _) = out.channels_mut();
    k.combine(op, out_v, out_c, a_v, a_c, b_v, b_c);
    Ok(())
}

// ── In place ────────────────────────────────────────────────────────

/// `acc = acc AND b`.
///
/// # Errors
///
/// [`TernaryError::DimensionMismatch`] unless the dims are identical.
pub fn batch_and_assign(acc: &mut Tensor<'_>, b: &Tensor<'_>) -> Result<(), TernaryError> {
    batch_and_assign_with(kernels(), acc, b)
}

/// `acc = acc OR b`.
///
/// # Errors
///
/// [`TernaryError::DimensionMismatch`] unless the dims are identical.
pub fn batch_or_assign(acc: &mut Tensor<'_>, b: &Tensor<'_>) -> Result<(), TernaryError> {
    batch_or_assign_with(kernels(), acc, b)
}

/// [`batch_and_assign`] on explicit kernels.
pub fn batch_and_assign_with(
    k: &dyn Kernels,
    acc: &mut Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    combine_assign(k, LogicOp::And, acc, b)
}

/// [`batch_or_assign`] on explicit kernels.
pub fn batch_or_assign_with(
    k: &dyn Kernels,
    acc: &mut Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    combine_assign(k, LogicOp::Or, acc, b)
}

fn combine_assign(
    k: &dyn Kernels,
    op: LogicOp,
    acc: &mut Tensor<'_>,
    b: &Tensor<'_>,
) -> Result<(), TernaryError> {
    check_same_dims(&format!("batch {op} assign"), acc, b)?;
    let (b_v, b_c, _) = b.channels();
    let (acc_v, acc_c, _) = acc.channels_mut();
    k.combine_assign(op, acc_v, acc_c, b_v, b_c);
    Ok(())
}

// ── Unary ───────────────────────────────────────────────────────────

/// `out = NOT a`. Confidence is copied unchanged.
///
/// # Errors
///
/// [`TernaryError::DimensionMismatch`] unless the dims are identical.
pub fn batch_not(out: &mut Tensor<'_>, a: &Tensor<'_>) -> Result<(), TernaryError> {
    batch_not_with(kernels(), out, a)
}

/// [`batch_not`] on explicit kernels.
pub fn batch_not_with(
    k: &dyn Kernels,
    out: &mut Tensor<'_>,
    a: &Tensor<'_>,
) -> Result<(), TernaryError> {
    check_same_dims("batch NOT", out, a)?;
    copy_logic(out, a);
    k.negate(out.channels_mut().0);
    Ok(())
}

/// Negate every value of `t` in place.
pub fn batch_not_in_place(t: &mut Tensor<'_>) {
    batch_not_in_place_with(kernels(), t);
}

/// [`batch_not_in_place`] on explicit kernels.
pub fn batch_not_in_place_with(k: &dyn Kernels, t: &mut Tensor<'_>) {
    k.negate(t.channels_mut().0);
}

// ── N-ary ───────────────────────────────────────────────────────────

/// Kleene AND over every tensor in `inputs`, with joint (product)
/// confidence.
///
/// # Errors
///
/// - [`TernaryError::NullParam`] if `inputs` is empty.
/// - [`TernaryError::DimensionMismatch`] unless every input matches `out`.
pub fn batch_all(out: &mut Tensor<'_>, inputs: &[&Tensor<'_>]) -> Result<(), TernaryError> {
    batch_all_with(kernels(), out, inputs)
}

/// Kleene OR over every tensor in `inputs`, with multi-path confidence
/// `1 - Π(1 - c_i)`.
///
/// # Errors
///
/// - [`TernaryError::NullParam`] if `inputs` is empty.
/// - [`TernaryError::DimensionMismatch`] unless every input matches `out`.
pub fn batch_any(out: &mut Tensor<'_>, inputs: &[&Tensor<'_>]) -> Result<(), TernaryError> {
    batch_any_with(kernels(), out, inputs)
}

/// [`batch_all`] on explicit kernels.
pub fn batch_all_with(
    k: &dyn Kernels,
    out: &mut Tensor<'_>,
    inputs: &[&Tensor<'_>],
) -> Result<(), TernaryError> {
    fold(k, LogicOp::And, out, inputs)
}

/// [`batch_any`] on explicit kernels.
pub fn batch_any_with(
    k: &dyn Kernels,
    out: &mut Tensor<'_>,
    inputs: &[&Tensor<'_>],
) -> Result<(), TernaryError> {
    fold(k, LogicOp::Or, out, inputs)
}

fn fold(
    k: &dyn Kernels,
    op: LogicOp,
    out: &mut Tensor<'_>,
    inputs: &[&Tensor<'_>],
) -> Result<(), TernaryError> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err(TernaryError::NullParam { param: "inputs" });
    };
    let name = format!("batch {op} over {} inputs", inputs.len());
    for input in inputs {
        check_same_dims(&name, out, input)?;
    }
    let rest: SmallVec<[(&[i8], &[f64]); 8]> = rest
        .iter()
        .map(|t| {
            let (v, c, _) = t.channels();
            (v, c)
        })
        .collect();
    copy_logic(out, first);
    let (acc_v, acc_c, _) = out.channels_mut();
    for (v, c) in rest {
        k.combine_assign(op, acc_v, acc_c, v, c);
    }
    Ok(())
}

/// Copy values and confidences of `src` into `dst`. Dims already checked.
fn copy_logic(dst: &mut Tensor<'_>, src: &Tensor<'_>) {
    let (src_v, src_c, _) = src.channels();
    let (dst_v, dst_c, _) = dst.channels_mut();
    dst_v.copy_from_slice(src_v);
    dst_c.copy_from_slice(src_c);
}
