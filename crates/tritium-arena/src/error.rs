//! Pool-specific error types.

use std::error::Error;
use std::fmt;

use tritium_core::TernaryError;

/// Errors that can occur during pool operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The [`PoolConfig`](crate::PoolConfig) failed validation.
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },
    /// The global allocator could not provide the backing region.
    RegionUnavailable {
        /// Size of the region that was requested.
        bytes: usize,
        /// Alignment of the region that was requested.
        alignment: usize,
    },
    /// No free block or bump space is large enough for the request.
    CapacityExceeded {
        /// Bytes requested (after size-class rounding).
        requested: usize,
        /// Bytes not currently handed out.
        available: usize,
    },
    /// A zero-byte block was requested.
    ZeroSizedRequest,
    /// Rounding the request up to its size class overflowed `usize`.
    SizeOverflow {
        /// The unrounded request.
        requested: usize,
    },
    /// A block was handed to a pool that did not allocate it.
    ForeignBlock,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
            Self::RegionUnavailable { bytes, alignment } => write!(
                f,
                "could not reserve {bytes} bytes aligned to {alignment} for the pool region"
            ),
            Self::CapacityExceeded {
                requested,
                available,
            } => write!(
                f,
                "pool capacity exceeded: requested {requested} bytes, {available} bytes available"
            ),
            Self::ZeroSizedRequest => write!(f, "zero-sized block requested"),
            Self::SizeOverflow { requested } => {
                write!(f, "size class of a {requested}-byte request overflows usize")
            }
            Self::ForeignBlock => write!(f, "block belongs to a different pool"),
        }
    }
}

impl Error for PoolError {}

impl From<PoolError> for TernaryError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::CapacityExceeded {
                requested,
                available,
            } => TernaryError::AllocationFailed {
                requested,
                available,
            },
            PoolError::RegionUnavailable { bytes, .. } => TernaryError::AllocationFailed {
                requested: bytes,
                available: 0,
            },
            PoolError::SizeOverflow { requested } => TernaryError::Overflow {
                reason: format!("size class of a {requested}-byte request"),
            },
            PoolError::ZeroSizedRequest => TernaryError::invalid("zero-sized block requested"),
            PoolError::InvalidConfig { reason } => TernaryError::InvalidParameter { reason },
            PoolError::ForeignBlock => TernaryError::invalid("block belongs to a different pool"),
        }
    }
}
