//! Tensor shapes.

use std::fmt;

use smallvec::SmallVec;

use crate::error::TernaryError;

/// Maximum tensor rank.
pub const MAX_DIMS: usize = 4;

/// An ordered list of 1 to [`MAX_DIMS`] positive extents.
///
/// Uses `SmallVec<[usize; 4]>` so shapes never touch the heap. The
/// element count is computed once, with checked multiplication, when the
/// shape is built.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; MAX_DIMS]>,
    len: usize,
}

impl Shape {
    /// Validate `dims` and build a shape.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::NullParam`] if `dims` is empty.
    /// - [`TernaryError::DimensionMismatch`] if there are more than
    ///   [`MAX_DIMS`] extents or any extent is zero.
    /// - [`TernaryError::Overflow`] if the product overflows `usize`.
    pub fn new(dims: &[usize]) -> Result<Self, TernaryError> {
        if dims.is_empty() {
            return Err(TernaryError::NullParam { param: "dims" });
        }
        if dims.len() > MAX_DIMS {
            return Err(TernaryError::mismatch(format!(
                "rank {} exceeds maximum of {MAX_DIMS}",
                dims.len()
            )));
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(TernaryError::mismatch(format!(
                "extent of axis {axis} is zero in {dims:?}"
            )));
        }
        let len = checked_product(dims).ok_or_else(|| TernaryError::Overflow {
            reason: format!("element count of {dims:?} overflows usize"),
        })?;
        Ok(Self {
            dims: SmallVec::from_slice(dims),
            len,
        })
    }

    /// The extents, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of axes.
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: zero extents are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extent of the innermost axis.
    pub fn last(&self) -> usize {
        // Construction guarantees at least one axis.
        self.dims[self.dims.len() - 1]
    }

    /// Product of every extent except the innermost (1 for rank-1 shapes).
    pub fn rows(&self) -> usize {
        self.len / self.last()
    }

    /// The same shape with the innermost extent replaced.
    ///
    /// # Errors
    ///
    /// Fails like [`Shape::new`] if `last` is zero or the new element
    /// count overflows.
    pub fn with_last(&self, last: usize) -> Result<Self, TernaryError> {
        let mut dims = self.dims.clone();
        let n = dims.len();
        dims[n - 1] = last;
        Self::new(&dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Overflow-checked product of `dims`.
pub fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}
