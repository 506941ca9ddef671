//! The fixed-capacity pool allocator.
//!
//! [`Pool`] owns one aligned region and a small piece of bookkeeping
//! behind a mutex: a bump cursor plus one free list per size class.
//! Allocation tries, in order, the exact-class free list, the bump
//! cursor, and finally the smallest larger class that has a free block.
//! The pool never grows and never blocks waiting for space.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::raw::RawRegion;

/// Counter for unique [`PoolId`] allocation.
static POOL_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a [`Pool`].
///
/// Two pools never share an id within a process, so blocks can be
/// checked against the pool they are returned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    fn next() -> Self {
        Self(POOL_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of pool occupancy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Size of the backing region in bytes.
    pub capacity_bytes: usize,
    /// Bytes currently handed out, counted at size-class granularity.
    pub bytes_in_use: usize,
    /// Number of live blocks.
    pub block_count: usize,
    /// Highest `bytes_in_use` seen since creation or the last reset.
    pub peak_bytes_in_use: usize,
    /// Position of the bump cursor; bytes past it have never been handed out.
    pub bump_cursor: usize,
    /// Free blocks per size class, as `(class_size, count)` sorted by class.
    pub free_by_class: Vec<(usize, usize)>,
    /// Allocation requests rejected for lack of space.
    pub failed_allocations: u64,
}

impl PoolStats {
    /// Bytes not currently handed out.
    pub fn bytes_available(&self) -> usize {
        self.capacity_bytes - self.bytes_in_use
    }

    /// Total number of blocks waiting on free lists.
    pub fn free_blocks(&self) -> usize {
        self.free_by_class.iter().map(|&(_, n)| n).sum()
    }
}

/// Mutable bookkeeping guarded by the pool mutex.
#[derive(Default)]
struct PoolState {
    cursor: usize,
    /// Size class → offsets of free blocks of that class.
    free: IndexMap<usize, Vec<usize>>,
    bytes_in_use: usize,
    live_blocks: usize,
    peak_bytes: usize,
    failed_allocs: u64,
}

impl PoolState {
    /// Find room for a block of `class` bytes.
    ///
    /// Returns `(offset, class_actually_used)`.
    fn take(&mut self, class: usize, capacity: usize) -> Option<(usize, usize)> {
        if let Some(offset) = self.free.get_mut(&class).and_then(Vec::pop) {
            return Some((offset, class));
        }
        if let Some(end) = self.cursor.checked_add(class) {
            if end <= capacity {
                let offset = self.cursor;
                self.cursor = end;
                return Some((offset, class));
            }
        }
        let larger = self
            .free
            .iter()
            .filter(|(k, v)| **k > class && !v.is_empty())
            .map(|(k, _)| *k)
            .min()?;
        let offset = self.free.get_mut(&larger)?.pop()?;
        Some((offset, larger))
    }

    fn commit(&mut self, class: usize) {
        self.bytes_in_use += class;
        self.live_blocks += 1;
        self.peak_bytes = self.peak_bytes.max(self.bytes_in_use);
    }
}

/// A fixed-capacity arena serving aligned blocks.
///
/// `alloc`, `free` and `stats` may be called concurrently from any number
/// of threads (`Pool: Sync`). Blocks are `Send`, so a block allocated on
/// one thread may be freed on another.
///
/// # Examples
///
/// ```
/// use tritium_arena::{Pool, PoolConfig};
///
/// let pool = Pool::new(PoolConfig::new(4096)).unwrap();
/// let block = pool.alloc(100).unwrap();
/// assert_eq!(block.addr() % 64, 0);
/// assert_eq!(pool.stats().block_count, 1);
///
/// pool.free(block).unwrap();
/// assert_eq!(pool.stats().bytes_in_use, 0);
/// ```
pub struct Pool {
    id: PoolId,
    config: PoolConfig,
    region: RawRegion,
    state: Mutex<PoolState>,
}

impl Pool {
    /// Reserve the backing region and build an empty pool.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if `config` fails validation.
    /// - [`PoolError::RegionUnavailable`] if the region cannot be reserved.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let region = RawRegion::allocate(config.capacity_bytes, config.alignment).ok_or(
            PoolError::RegionUnavailable {
                bytes: config.capacity_bytes,
                alignment: config.alignment,
            },
        )?;
        let id = PoolId::next();
        info!(
            pool = %id,
            capacity_bytes = config.capacity_bytes,
            alignment = config.alignment,
            "created pool"
        );
        Ok(Self {
            id,
            config,
            region,
            state: Mutex::new(PoolState::default()),
        })
    }

    /// Shorthand for `Pool::new(PoolConfig::new(capacity_bytes))`.
    pub fn with_capacity(capacity_bytes: usize) -> Result<Self, PoolError> {
        Self::new(PoolConfig::new(capacity_bytes))
    }

    /// This pool's identity.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Size of the backing region in bytes.
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Alignment of every block address.
    pub fn alignment(&self) -> usize {
        self.config.alignment
    }

    /// The size class a request of `size` bytes is rounded up to.
    ///
    /// # Errors
    ///
    /// [`PoolError::ZeroSizedRequest`] for `size == 0`,
    /// [`PoolError::SizeOverflow`] if rounding overflows.
    pub fn class_size(&self, size: usize) -> Result<usize, PoolError> {
        if size == 0 {
            return Err(PoolError::ZeroSizedRequest);
        }
        let mask = self.config.alignment - 1;
        size.checked_add(mask)
            .map(|s| s & !mask)
            .and_then(usize::checked_next_power_of_two)
            .ok_or(PoolError::SizeOverflow { requested: size })
    }

    /// Allocate a block of at least `size` bytes.
    ///
    /// Never grows the region and never waits: if nothing fits the call
    /// fails immediately with [`PoolError::CapacityExceeded`].
    ///
    /// # Errors
    ///
    /// See [`Pool::class_size`] and [`PoolError::CapacityExceeded`].
    pub fn alloc(&self, size: usize) -> Result<Block<'_>, PoolError> {
        let class = self.class_size(size)?;
        let capacity = self.capacity();
        let mut state = self.lock_state();
        let Some((offset, used_class)) = state.take(class, capacity) else {
            state.failed_allocs += 1;
            let available = capacity - state.bytes_in_use;
            drop(state);
            debug!(pool = %self.id, requested = class, available, "pool allocation refused");
            return Err(PoolError::CapacityExceeded {
                requested: class,
                available,
            });
        };
        state.commit(used_class);
        drop(state);
        Ok(Block::new(
            self,
            self.region.span(offset, size),
            offset,
            used_class,
        ))
    }

    /// Return a block to this pool.
    ///
    /// Equivalent to dropping the block, with an ownership check first.
    ///
    /// # Errors
    ///
    /// [`PoolError::ForeignBlock`] if `block` came from another pool. The
    /// block is still returned to the pool that owns it.
    pub fn free(&self, block: Block<'_>) -> Result<(), PoolError> {
        if block.pool_id() != self.id {
            warn!(pool = %self.id, owner = %block.pool_id(), "block freed into foreign pool");
            return Err(PoolError::ForeignBlock);
        }
        drop(block);
        Ok(())
    }

    /// Snapshot of occupancy counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.lock_state();
        let mut free_by_class: Vec<(usize, usize)> = state
            .free
            .iter()
            .filter(|(_, offsets)| !offsets.is_empty())
            .map(|(class, offsets)| (*class, offsets.len()))
            .collect();
        free_by_class.sort_unstable();
        PoolStats {
            capacity_bytes: self.capacity(),
            bytes_in_use: state.bytes_in_use,
            block_count: state.live_blocks,
            peak_bytes_in_use: state.peak_bytes,
            bump_cursor: state.cursor,
            free_by_class,
            failed_allocations: state.failed_allocs,
        }
    }

    /// Bytes currently handed out.
    pub fn bytes_in_use(&self) -> usize {
        self.lock_state().bytes_in_use
    }

    /// Forget every free list and rewind the bump cursor.
    ///
    /// Taking `&mut self` proves no block is alive, so the whole region
    /// becomes bump space again. Counters other than `failed_allocations`
    /// are cleared.
    pub fn reset(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let failed_allocs = state.failed_allocs;
        *state = PoolState {
            failed_allocs,
            ..PoolState::default()
        };
    }

    /// Called from `Block::drop`.
    pub(crate) fn release(&self, offset: usize, class: usize) {
        let mut state = self.lock_state();
        state.free.entry(class).or_default().push(offset);
        state.bytes_in_use -= class;
        state.live_blocks -= 1;
    }

    /// Every critical section leaves the state consistent before it can
    /// panic, so a poisoned lock is safe to reuse.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("alignment", &self.config.alignment)
            .finish_non_exhaustive()
    }
}
