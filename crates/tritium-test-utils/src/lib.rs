//! Test utilities for Tritium development.
//!
//! Provides deterministic [`EntropySource`] implementations and fixture
//! builders in [`fixtures`] for constructing tensors with known contents.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{assert_close, scratch_pool, tensor_from, trits};

use tritium_nn::EntropySource;

/// Replays a fixed list of draws, cycling when it runs out.
///
/// `seed` rewinds to the first draw; the seed bytes are ignored.
#[derive(Clone, Debug)]
pub struct ScriptedEntropy {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedEntropy {
    /// # Panics
    ///
    /// Panics if `draws` is empty.
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "ScriptedEntropy needs at least one draw");
        Self { draws, cursor: 0 }
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl EntropySource for ScriptedEntropy {
    fn next_uniform(&mut self) -> f64 {
        let u = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        u
    }

    fn seed(&mut self, _bytes: &[u8]) {
        self.cursor = 0;
    }
}

/// Always returns the same draw.
#[derive(Clone, Copy, Debug)]
pub struct ConstantEntropy(pub f64);

impl EntropySource for ConstantEntropy {
    fn next_uniform(&mut self) -> f64 {
        self.0
    }

    fn seed(&mut self, _bytes: &[u8]) {}
}
