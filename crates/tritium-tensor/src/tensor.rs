//! The pool-backed ternary tensor.

use std::fmt;

use tritium_arena::{Block, Pool};
use tritium_core::{confidence, Shape, TernaryError, Trit};

/// Byte offsets of the three channels inside a tensor's block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChannelLayout {
    confidence: usize,
    gradient: usize,
    total: usize,
}

impl ChannelLayout {
    /// Values (`i8`) first, then confidence and gradient (`f64`), each
    /// channel starting on an `alignment` boundary.
    fn compute(len: usize, alignment: usize) -> Option<Self> {
        let float_bytes = len.checked_mul(size_of::<f64>())?;
        let confidence = align_up(len, alignment)?;
        let gradient = confidence.checked_add(align_up(float_bytes, alignment)?)?;
        let total = gradient.checked_add(float_bytes)?;
        Some(Self {
            confidence,
            gradient,
            total,
        })
    }
}

fn align_up(n: usize, alignment: usize) -> Option<usize> {
    let mask = alignment - 1;
    n.checked_add(mask).map(|x| x & !mask)
}

/// An n-dimensional (1 ≤ n ≤ 4) struct-of-arrays of
/// `(value, confidence, gradient)` triples.
///
/// All three channels live in a single [`Block`] of the pool the tensor
/// was created from. The tensor borrows that pool, so it cannot outlive
/// it, and dropping the tensor (or calling [`Tensor::destroy`]) returns
/// the block.
///
/// Confidences always lie in `[0, 1]`: every write path clamps or
/// validates.
pub struct Tensor<'p> {
    block: Block<'p>,
    shape: Shape,
    layout: ChannelLayout,
}

impl<'p> Tensor<'p> {
    /// Allocate a tensor of shape `dims` from `pool`.
    ///
    /// Every element starts as UNKNOWN with confidence `1.0` and gradient
    /// `0.0`.
    ///
    /// # Errors
    ///
    /// - Shape validation errors from [`Shape::new`].
    /// - [`TernaryError::Overflow`] if the combined channel size overflows.
    /// - [`TernaryError::AllocationFailed`] if the pool cannot serve it.
    pub fn new(pool: &'p Pool, dims: &[usize]) -> Result<Self, TernaryError> {
        let shape = Shape::new(dims)?;
        let layout = ChannelLayout::compute(shape.len(), pool.alignment()).ok_or_else(|| {
            TernaryError::Overflow {
                reason: format!("channel layout of a {shape} tensor overflows usize"),
            }
        })?;
        let block = pool.alloc(layout.total)?;
        let mut tensor = Self {
            block,
            shape,
            layout,
        };
        let (values, confidences, gradients) = tensor.channels_mut();
        values.fill(0);
        confidences.fill(1.0);
        gradients.fill(0.0);
        Ok(tensor)
    }

    /// Return the tensor's storage to its pool.
    ///
    /// Equivalent to dropping the tensor.
    pub fn destroy(self) {
        drop(self);
    }

    /// The tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The extents, outermost first.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of axes.
    pub fn ndims(&self) -> usize {
        self.shape.ndims()
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    /// Always `false`: tensors have at least one element.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// The pool backing this tensor.
    pub fn pool(&self) -> &'p Pool {
        self.block.pool()
    }

    /// Value of element `i` (flat, row-major).
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn value(&self, i: usize) -> Trit {
        Trit::from_signum(self.encoded_values()[i])
    }

    /// Confidence of element `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn confidence(&self, i: usize) -> f64 {
        self.confidences()[i]
    }

    /// Gradient of element `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn gradient(&self, i: usize) -> f64 {
        self.gradients()[i]
    }

    /// Iterate over the values in row-major order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = Trit> + '_ {
        self.encoded_values().iter().map(|&v| Trit::from_signum(v))
    }

    /// The value channel in its `i8` encoding.
    pub fn encoded_values(&self) -> &[i8] {
        self.channels().0
    }

    /// The confidence channel.
    pub fn confidences(&self) -> &[f64] {
        self.channels().1
    }

    /// The gradient channel.
    pub fn gradients(&self) -> &[f64] {
        self.channels().2
    }

    /// Overwrite element `i`.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] if `i` is out of range.
    /// - [`TernaryError::InvalidParameter`] if `confidence` is outside `[0, 1]`.
    pub fn set(&mut self, i: usize, value: Trit, confidence: f64) -> Result<(), TernaryError> {
        if i >= self.len() {
            return Err(TernaryError::mismatch(format!(
                "index {i} out of range for {} elements",
                self.len()
            )));
        }
        if !confidence::is_valid(confidence) {
            return Err(TernaryError::invalid(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        let (values, confidences, _) = self.channels_mut();
        values[i] = value.as_i8();
        confidences[i] = confidence;
        Ok(())
    }

    /// Overwrite every value and confidence.
    ///
    /// All inputs are validated before anything is written.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] if either slice length differs
    ///   from `self.len()`.
    /// - [`TernaryError::InvalidParameter`] if any confidence is outside `[0, 1]`.
    pub fn fill(&mut self, values: &[Trit], confidences: &[f64]) -> Result<(), TernaryError> {
        let n = self.len();
        if values.len() != n || confidences.len() != n {
            return Err(TernaryError::mismatch(format!(
                "fill of a {} tensor with {} values and {} confidences",
                self.shape,
                values.len(),
                confidences.len()
            )));
        }
        if let Some(i) = confidences.iter().position(|&c| !confidence::is_valid(c)) {
            return Err(TernaryError::invalid(format!(
                "confidence {} at index {i} outside [0, 1]",
                confidences[i]
            )));
        }
        let (dst_v, dst_c, _) = self.channels_mut();
        for (d, v) in dst_v.iter_mut().zip(values) {
            *d = v.as_i8();
        }
        dst_c.copy_from_slice(confidences);
        Ok(())
    }

    /// Zero the gradient channel.
    pub fn reset_gradients(&mut self) {
        self.channels_mut().2.fill(0.0);
    }

    /// Typed mutable views of all three channels at once.
    pub fn parts_mut(&mut self) -> TensorPartsMut<'_> {
        let (values, confidence, gradient) = self.channels_mut();
        TensorPartsMut {
            values: TritsMut(values),
            confidence: ConfidenceMut(confidence),
            gradient,
        }
    }

    /// Raw channel slices. Crate-internal kernels write through these; the
    /// encodings they store are always in `{-1, 0, 1}` and `[0, 1]`.
    pub(crate) fn channels(&self) -> (&[i8], &[f64], &[f64]) {
        let n = self.len();
        let bytes = self.block.as_bytes();
        let values = bytemuck::cast_slice(&bytes[..n]);
        let conf_bytes = &bytes[self.layout.confidence..self.layout.confidence + n * 8];
        let grad_bytes = &bytes[self.layout.gradient..self.layout.gradient + n * 8];
        (
            values,
            bytemuck::cast_slice(conf_bytes),
            bytemuck::cast_slice(grad_bytes),
        )
    }

    pub(crate) fn channels_mut(&mut self) -> (&mut [i8], &mut [f64], &mut [f64]) {
        let n = self.len();
        let ChannelLayout {
            confidence,
            gradient,
            ..
        } = self.layout;
        let bytes = self.block.as_bytes_mut();
        let (head, grad_bytes) = bytes.split_at_mut(gradient);
        let (value_bytes, conf_bytes) = head.split_at_mut(confidence);
        (
            bytemuck::cast_slice_mut(&mut value_bytes[..n]),
            bytemuck::cast_slice_mut(&mut conf_bytes[..n * 8]),
            bytemuck::cast_slice_mut(&mut grad_bytes[..n * 8]),
        )
    }
}

impl fmt::Debug for Tensor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape.dims())
            .field("pool", &self.block.pool_id())
            .field("bytes", &self.block.len())
            .finish_non_exhaustive()
    }
}

/// Mutable views of a tensor's three channels, from [`Tensor::parts_mut`].
#[derive(Debug)]
pub struct TensorPartsMut<'a> {
    /// The value channel.
    pub values: TritsMut<'a>,
    /// The confidence channel; writes are clamped to `[0, 1]`.
    pub confidence: ConfidenceMut<'a>,
    /// The gradient channel. Unconstrained.
    pub gradient: &'a mut [f64],
}

/// Mutable view of a value channel that only accepts [`Trit`]s.
#[derive(Debug)]
pub struct TritsMut<'a>(&'a mut [i8]);

impl TritsMut<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of element `i`.
    pub fn get(&self, i: usize) -> Trit {
        Trit::from_signum(self.0[i])
    }

    /// Overwrite element `i`.
    pub fn set(&mut self, i: usize, value: Trit) {
        self.0[i] = value.as_i8();
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: Trit) {
        self.0.fill(value.as_i8());
    }

    /// The raw encodings.
    pub fn as_encoded(&self) -> &[i8] {
        self.0
    }
}

/// Mutable view of a confidence channel that keeps every entry in `[0, 1]`.
#[derive(Debug)]
pub struct ConfidenceMut<'a>(&'a mut [f64]);

impl ConfidenceMut<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Confidence of element `i`.
    pub fn get(&self, i: usize) -> f64 {
        self.0[i]
    }

    /// Store `c` at `i`, clamped to `[0, 1]` (NaN becomes `0`).
    pub fn set_clamped(&mut self, i: usize, c: f64) {
        self.0[i] = confidence::clamp_unit(c);
    }

    /// Read-only view of the channel.
    pub fn as_slice(&self) -> &[f64] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tritium_core::ErrorKind;

    fn pool() -> Pool {
        Pool::with_capacity(1 << 16).unwrap()
    }

    #[test]
    fn layout_aligns_each_channel() {
        let l = ChannelLayout::compute(5, 64).unwrap();
        assert_eq!(l.confidence, 64);
        assert_eq!(l.gradient, 128);
        assert_eq!(l.total, 168);
    }

    #[test]
    fn layout_overflow_is_detected() {
        assert!(ChannelLayout::compute(usize::MAX / 4, 64).is_none());
    }

    #[test]
    fn new_tensor_is_unknown_with_full_confidence() {
        let p = pool();
        let t = Tensor::new(&p, &[2, 3]).unwrap();
        assert_eq!(t.len(), 6);
        assert_eq!(t.ndims(), 2);
        assert!(t.values().all(|v| v == Trit::Unknown));
        assert!(t.confidences().iter().all(|&c| c == 1.0));
        assert!(t.gradients().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn reused_block_is_reinitialised() {
        let p = pool();
        let mut t = Tensor::new(&p, &[4]).unwrap();
        t.fill(&[Trit::True; 4], &[0.3; 4]).unwrap();
        t.parts_mut().gradient.fill(9.0);
        t.destroy();
        let t = Tensor::new(&p, &[4]).unwrap();
        assert!(t.values().all(|v| v == Trit::Unknown));
        assert_eq!(t.confidences(), &[1.0; 4]);
        assert_eq!(t.gradients(), &[0.0; 4]);
    }

    #[test]
    fn create_destroy_restores_pool_usage() {
        let p = pool();
        let before = p.bytes_in_use();
        let t = Tensor::new(&p, &[3, 4, 5]).unwrap();
        assert!(p.bytes_in_use() > before);
        t.destroy();
        assert_eq!(p.bytes_in_use(), before);
    }

    #[test]
    fn overflowing_dims_report_overflow() {
        let p = pool();
        let err = Tensor::new(&p, &[usize::MAX, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let err = Tensor::new(&p, &[usize::MAX / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(p.bytes_in_use(), 0);
    }

    #[test]
    fn exhausted_pool_reports_allocation_failed() {
        let p = Pool::with_capacity(256).unwrap();
        let err = Tensor::new(&p, &[1000]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocationFailed);
    }

    #[test]
    fn bad_dims_are_rejected() {
        let p = pool();
        assert_eq!(Tensor::new(&p, &[]).unwrap_err().kind(), ErrorKind::NullParam);
        assert_eq!(
            Tensor::new(&p, &[1, 2, 3, 4, 5]).unwrap_err().kind(),
            ErrorKind::DimensionMismatch
        );
    }

    #[test]
    fn set_validates_before_writing() {
        let p = pool();
        let mut t = Tensor::new(&p, &[2]).unwrap();
        assert!(t.set(2, Trit::True, 0.5).is_err());
        assert!(t.set(0, Trit::True, 1.5).is_err());
        assert!(t.set(0, Trit::True, f64::NAN).is_err());
        assert_eq!(t.value(0), Trit::Unknown);
        t.set(1, Trit::False, 0.25).unwrap();
        assert_eq!(t.value(1), Trit::False);
        assert_eq!(t.confidence(1), 0.25);
    }

    #[test]
    fn fill_is_all_or_nothing() {
        let p = pool();
        let mut t = Tensor::new(&p, &[3]).unwrap();
        let err = t
            .fill(&[Trit::True, Trit::True, Trit::True], &[0.5, 2.0, 0.5])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(t.values().all(|v| v == Trit::Unknown));
        let err = t.fill(&[Trit::True], &[0.5]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn parts_mut_clamps_confidence() {
        let p = pool();
        let mut t = Tensor::new(&p, &[3]).unwrap();
        let mut parts = t.parts_mut();
        parts.confidence.set_clamped(0, 1.7);
        parts.confidence.set_clamped(1, -0.2);
        parts.confidence.set_clamped(2, f64::NAN);
        parts.values.set(0, Trit::True);
        parts.gradient[2] = -3.0;
        assert_eq!(t.confidences(), &[1.0, 0.0, 0.0]);
        assert_eq!(t.value(0), Trit::True);
        assert_eq!(t.gradient(2), -3.0);
        t.reset_gradients();
        assert_eq!(t.gradient(2), 0.0);
    }

    #[test]
    fn channels_do_not_overlap() {
        let p = pool();
        let mut t = Tensor::new(&p, &[17]).unwrap();
        {
            let (v, c, g) = t.channels_mut();
            v.fill(-1);
            c.fill(0.5);
            g.fill(2.0);
        }
        assert!(t.values().all(|v| v == Trit::False));
        assert!(t.confidences().iter().all(|&c| c == 0.5));
        assert!(t.gradients().iter().all(|&g| g == 2.0));
    }
}
