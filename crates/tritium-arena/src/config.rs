//! Pool configuration parameters.

use crate::error::PoolError;

/// Configuration for a [`Pool`](crate::Pool).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size of the backing region in bytes. Must be non-zero.
    pub capacity_bytes: usize,

    /// Alignment of the region base and of every block, in bytes.
    ///
    /// Default: 64 (one cache line). Must be a power of two and at
    /// least 8 so `f64` channels can be laid out at any block offset.
    pub alignment: usize,
}

impl PoolConfig {
    /// Default block alignment: one 64-byte cache line.
    pub const DEFAULT_ALIGNMENT: usize = 64;

    /// Smallest accepted alignment.
    pub const MIN_ALIGNMENT: usize = 8;

    /// Create a config for the given capacity with default alignment.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Override the alignment.
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the capacity is zero or the
    /// alignment is not a power of two of at least [`Self::MIN_ALIGNMENT`].
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.capacity_bytes == 0 {
            return Err(PoolError::InvalidConfig {
                reason: "capacity_bytes must be non-zero".into(),
            });
        }
        if !self.alignment.is_power_of_two() || self.alignment < Self::MIN_ALIGNMENT {
            return Err(PoolError::InvalidConfig {
                reason: format!(
                    "alignment must be a power of two >= {}, got {}",
                    Self::MIN_ALIGNMENT,
                    self.alignment
                ),
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// 16 MiB with 64-byte alignment.
    fn default() -> Self {
        Self::new(16 * 1024 * 1024)
    }
}
