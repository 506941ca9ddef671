//! Blocks handed out by a [`Pool`].

use std::fmt;

use crate::pool::{Pool, PoolId};
use crate::raw::RawSpan;

/// An exclusively owned, aligned range of pool memory.
///
/// A block borrows the pool it came from, so it cannot outlive it.
/// Dropping a block returns it to the pool's free list for its size
/// class; [`Pool::free`] does the same with an ownership check.
#[must_use]
pub struct Block<'p> {
    pool: &'p Pool,
    span: RawSpan,
    offset: usize,
    class_size: usize,
}

impl<'p> Block<'p> {
    pub(crate) fn new(pool: &'p Pool, span: RawSpan, offset: usize, class_size: usize) -> Self {
        Self {
            pool,
            span,
            offset,
            class_size,
        }
    }

    /// Usable length in bytes (the size originally requested).
    pub fn len(&self) -> usize {
        self.span.bytes().len()
    }

    /// Always `false`: the pool rejects zero-sized requests.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size class this block was filed under; at least [`Block::len`].
    pub fn class_size(&self) -> usize {
        self.class_size
    }

    /// Byte offset of the block from the start of the pool region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Address of the first byte. Always a multiple of the pool alignment.
    pub fn addr(&self) -> usize {
        self.span.addr()
    }

    /// The block's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.span.bytes()
    }

    /// The block's bytes, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.span.bytes_mut()
    }

    /// The pool this block was allocated from.
    pub fn pool(&self) -> &'p Pool {
        self.pool
    }

    /// Identity of the owning pool.
    pub fn pool_id(&self) -> PoolId {
        self.pool.id()
    }
}

impl Drop for Block<'_> {
    fn drop(&mut self) {
        self.pool.release(self.offset, self.class_size);
    }
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("pool", &self.pool.id())
            .field("offset", &self.offset)
            .field("len", &self.len())
            .field("class_size", &self.class_size)
            .finish()
    }
}
