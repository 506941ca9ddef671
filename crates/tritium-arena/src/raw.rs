//! Low-level primitives for the pool's backing memory.
//!
//! Every `unsafe` block in the workspace lives in this module, each with
//! a `// SAFETY:` comment. The rest of the crate sees two safe types:
//! [`RawRegion`] (the owned allocation) and [`RawSpan`] (an exclusive
//! window into it).

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

/// One aligned, zero-filled heap allocation of fixed size.
pub(crate) struct RawRegion {
    base: NonNull<u8>,
    layout: Layout,
}

impl RawRegion {
    /// Reserve `size` bytes aligned to `align`.
    ///
    /// Returns `None` if the layout is invalid, `size` is zero, or the
    /// global allocator refuses the request.
    pub(crate) fn allocate(size: usize, align: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, align).ok()?;
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: `layout` has a non-zero size, checked above.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|base| Self { base, layout })
    }

    /// Size of the region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Address of the first byte, for alignment checks.
    #[cfg(test)]
    pub(crate) fn base_addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Carve out `offset..offset + len`.
    ///
    /// The pool guarantees that no two live spans overlap; that is what
    /// makes handing out `&mut [u8]` from [`RawSpan::bytes_mut`] sound.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie inside the region.
    pub(crate) fn span(&self, offset: usize, len: usize) -> RawSpan {
        let in_bounds = offset
            .checked_add(len)
            .is_some_and(|end| end <= self.len());
        assert!(in_bounds, "span {offset}+{len} outside region of {}", self.len());
        // SAFETY: `offset <= self.len()` (checked above), so the pointer
        // stays within (or one past the end of) the allocation and is
        // therefore non-null.
        let ptr = unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) };
        RawSpan { ptr, len }
    }
}

impl Drop for RawRegion {
    fn drop(&mut self) {
        // SAFETY: `base` was returned by `alloc_zeroed` with exactly this
        // layout and is deallocated only here.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}

// SAFETY: the region is plain bytes with no thread affinity. Concurrent
// access only ever happens through disjoint `RawSpan`s.
unsafe impl Send for RawRegion {}
// SAFETY: `&RawRegion` only exposes `len`, `base_addr` and `span`, none of
// which read or write the bytes themselves.
unsafe impl Sync for RawRegion {}

/// An exclusive window of `len` bytes into a [`RawRegion`].
///
/// Not `Clone`: at most one span exists per live range.
pub(crate) struct RawSpan {
    ptr: NonNull<u8>,
    len: usize,
}

impl RawSpan {
    /// The span's bytes.
    pub(crate) fn bytes(&self) -> &[u8] {
        // SAFETY: the span lies inside a live region (the owning `Block`
        // borrows the pool), the bytes were initialised by
        // `alloc_zeroed` or by earlier writes, and no `&mut` alias exists
        // while `&self` is held.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The span's bytes, mutably.
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as for `bytes`; `&mut self` guarantees exclusivity and
        // the pool guarantees no other span covers these bytes.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Address of the first byte.
    pub(crate) fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

// SAFETY: a span is an exclusive handle to its bytes; moving it to another
// thread moves that exclusivity with it.
unsafe impl Send for RawSpan {}
// SAFETY: `&RawSpan` only yields `&[u8]`, which is safe to share.
unsafe impl Sync for RawSpan {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_aligned_and_zeroed() {
        let region = RawRegion::allocate(1024, 64).unwrap();
        assert_eq!(region.base_addr() % 64, 0);
        let span = region.span(0, 1024);
        assert!(span.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_sized_region_is_refused() {
        assert!(RawRegion::allocate(0, 64).is_none());
    }

    #[test]
    fn invalid_alignment_is_refused() {
        assert!(RawRegion::allocate(64, 3).is_none());
    }

    #[test]
    fn disjoint_spans_write_independently() {
        let region = RawRegion::allocate(256, 64).unwrap();
        let mut a = region.span(0, 128);
        let mut b = region.span(128, 128);
        a.bytes_mut().fill(1);
        b.bytes_mut().fill(2);
        assert!(a.bytes().iter().all(|&x| x == 1));
        assert!(b.bytes().iter().all(|&x| x == 2));
        assert_eq!(b.addr() - a.addr(), 128);
    }

    #[test]
    #[should_panic(expected = "outside region")]
    fn out_of_bounds_span_panics() {
        let region = RawRegion::allocate(64, 64).unwrap();
        let _ = region.span(32, 64);
    }
}
