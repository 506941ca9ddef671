//! Fixed-capacity pooled allocation for Tritium tensors.
//!
//! A [`Pool`] reserves one aligned region up front and hands out
//! [`Block`]s from it. Blocks never come from or go back to the OS
//! individually: freeing a block files it under its size class for reuse,
//! and the whole region is released when the pool is dropped. This crate
//! is the only one in the workspace that contains `unsafe` code, and all
//! of it lives in `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! Pool
//! ├── RawRegion (one aligned, zero-filled allocation, fixed capacity)
//! └── Mutex<PoolState>
//!     ├── bump cursor (never moves backwards until reset)
//!     └── free lists: size class → offsets (IndexMap, insertion-ordered)
//! ```
//!
//! # Size classes
//!
//! A request of `n` bytes is rounded up to a multiple of the pool
//! alignment and then to the next power of two. Every block offset is
//! therefore a multiple of the alignment, and freed blocks are reused by
//! any later request of the same class.
//!
//! # Lifetimes
//!
//! `Pool::alloc` returns a `Block<'_>` borrowing the pool, so a block can
//! never outlive the region it points into. Dropping a block frees it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod pool;
mod raw;

pub use block::Block;
pub use config::PoolConfig;
pub use error::PoolError;
pub use pool::{Pool, PoolId, PoolStats};
