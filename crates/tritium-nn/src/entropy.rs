//! Injected randomness for weight initialisation.
//!
//! Layers never reach for a thread-local RNG. Callers pass an
//! [`EntropySource`], which makes initialisation reproducible from a
//! seed and lets tests script exact draws.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A stream of uniform samples in `[0, 1)`.
pub trait EntropySource {
    /// Next sample in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Restart the stream from `bytes`.
    fn seed(&mut self, bytes: &[u8]);
}

/// Deterministic ChaCha8 stream.
///
/// Not suitable for anything security-sensitive; it exists so that the
/// same seed always produces the same layer.
#[derive(Clone, Debug)]
pub struct ChaChaEntropy {
    rng: ChaCha8Rng,
}

impl ChaChaEntropy {
    /// Seed from a `u64`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed from arbitrary bytes, XOR-folded into the 32-byte key.
    pub fn from_seed_bytes(bytes: &[u8]) -> Self {
        Self {
            rng: ChaCha8Rng::from_seed(fold_key(bytes)),
        }
    }
}

impl EntropySource for ChaChaEntropy {
    fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn seed(&mut self, bytes: &[u8]) {
        self.rng = ChaCha8Rng::from_seed(fold_key(bytes));
    }
}

fn fold_key(bytes: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    for (i, b) in bytes.iter().enumerate() {
        key[i % 32] ^= b;
    }
    key
}
