//! Benchmark profiles and fixtures for the Tritium engine.
//!
//! - [`reference_profile`]: a small three-layer stack on a 16 MiB pool
//! - [`stress_profile`]: the same topology at roughly 10x the element count
//! - [`random_tensor`] / [`build_stack`]: deterministic fixtures from a seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tritium_arena::{Pool, PoolConfig};
use tritium_core::{TernaryError, Trit};
use tritium_nn::{ChaChaEntropy, Layer};
use tritium_tensor::Tensor;

/// Sizes for one benchmark scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchProfile {
    /// Capacity of the pool every fixture is allocated from.
    pub pool_bytes: usize,
    /// Rows per forward batch.
    pub batch: usize,
    /// Layer widths, input first: `[in, hidden.., out]`.
    pub widths: Vec<usize>,
}

impl BenchProfile {
    /// Build the pool for this profile.
    pub fn pool(&self) -> Result<Pool, TernaryError> {
        Ok(Pool::new(PoolConfig::new(self.pool_bytes))?)
    }
}

/// 64-wide input, two hidden layers, batch of 32.
pub fn reference_profile() -> BenchProfile {
    BenchProfile {
        pool_bytes: 16 << 20,
        batch: 32,
        widths: vec![64, 128, 64, 8],
    }
}

/// 256-wide input, batch of 128.
pub fn stress_profile() -> BenchProfile {
    BenchProfile {
        pool_bytes: 256 << 20,
        batch: 128,
        widths: vec![256, 512, 256, 16],
    }
}

/// A tensor of shape `dims` with uniformly random values and confidences.
pub fn random_tensor<'p>(
    pool: &'p Pool,
    dims: &[usize],
    seed: u64,
) -> Result<Tensor<'p>, TernaryError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut t = Tensor::new(pool, dims)?;
    let mut parts = t.parts_mut();
    for i in 0..parts.values.len() {
        parts.values.set(i, Trit::ALL[rng.random_range(0..3)]);
        parts.confidence.set_clamped(i, rng.random::<f64>());
    }
    Ok(t)
}

/// One layer per consecutive pair of `profile.widths`, seeded from `seed`.
pub fn build_stack<'p>(
    pool: &'p Pool,
    profile: &BenchProfile,
    seed: u64,
) -> Result<Vec<Layer<'p>>, TernaryError> {
    let mut entropy = ChaChaEntropy::new(seed);
    profile
        .widths
        .windows(2)
        .map(|w| Layer::new(pool, w[0], w[1], &mut entropy))
        .collect()
}

/// Run `input` through every layer of `stack`.
pub fn forward_stack<'p>(
    stack: &[Layer<'p>],
    input: &Tensor<'_>,
) -> Result<Tensor<'p>, TernaryError> {
    let (first, rest) = stack
        .split_first()
        .ok_or(TernaryError::NullParam { param: "stack" })?;
    let mut h = first.forward(input)?;
    for layer in rest {
        h = layer.forward(&h)?;
    }
    Ok(h)
}
