//! Error types for the Tritium engine.
//!
//! Every fallible engine operation returns a [`TernaryError`]. Each
//! variant maps onto one [`ErrorKind`] so callers can branch on the
//! category without matching the detail fields.

use std::error::Error;
use std::fmt;

/// Coarse error category.
///
/// [`ErrorKind::SerializationError`] is never produced by this crate; it
/// is reported by the model codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument was missing or empty.
    NullParam,
    /// Shapes or lengths do not agree.
    DimensionMismatch,
    /// A size computation overflowed `usize`.
    Overflow,
    /// The pool could not serve the request.
    AllocationFailed,
    /// A scalar parameter was out of its domain.
    InvalidParameter,
    /// A byte stream could not be encoded or decoded.
    SerializationError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NullParam => "null parameter",
            Self::DimensionMismatch => "dimension mismatch",
            Self::Overflow => "overflow",
            Self::AllocationFailed => "allocation failed",
            Self::InvalidParameter => "invalid parameter",
            Self::SerializationError => "serialization error",
        };
        f.write_str(s)
    }
}

/// Errors from tensor, layer and gradient operations.
///
/// Operations validate before they write, so receiving an error means
/// no tensor was modified.
#[derive(Clone, Debug, PartialEq)]
pub enum TernaryError {
    /// A required argument was empty (no dims, no input tensors).
    NullParam {
        /// Name of the missing argument.
        param: &'static str,
    },
    /// Shapes, extents or lengths do not agree.
    DimensionMismatch {
        /// What was expected versus what was supplied.
        reason: String,
    },
    /// A size computation overflowed.
    Overflow {
        /// Which computation overflowed.
        reason: String,
    },
    /// The backing pool could not serve the request.
    AllocationFailed {
        /// Bytes requested.
        requested: usize,
        /// Bytes still available in the pool.
        available: usize,
    },
    /// A scalar argument or config value is outside its domain.
    InvalidParameter {
        /// Description of the violated constraint.
        reason: String,
    },
}

impl TernaryError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullParam { .. } => ErrorKind::NullParam,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::AllocationFailed { .. } => ErrorKind::AllocationFailed,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
        }
    }

    /// Shorthand for a [`TernaryError::DimensionMismatch`].
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`TernaryError::InvalidParameter`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TernaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullParam { param } => write!(f, "missing required parameter '{param}'"),
            Self::DimensionMismatch { reason } => write!(f, "dimension mismatch: {reason}"),
            Self::Overflow { reason } => write!(f, "size overflow: {reason}"),
            Self::AllocationFailed {
                requested,
                available,
            } => write!(
                f,
                "allocation failed: requested {requested} bytes, {available} bytes available"
            ),
            Self::InvalidParameter { reason } => write!(f, "invalid parameter: {reason}"),
        }
    }
}

impl Error for TernaryError {}
