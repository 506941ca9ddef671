//! Binary model format for Tritium layers.
//!
//! Saves and restores stacks of [`Layer`](tritium_nn::Layer)s. The
//! format carries values and confidences only; gradients are transient
//! and start at zero after loading. All I/O goes through a small custom
//! codec (no serde dependency).
//!
//! # Format
//!
//! ```text
//! [MAGIC "TRIT"] [VERSION u32] [layer count u32]
//! per layer:
//!   [output size u64] [input size u64]
//!   [weight values i8 × out·in] [weight confidences f64 × out·in]
//!   [bias values i8 × out] [bias confidences f64 × out]
//! ```
//!
//! All integers and floats are little-endian. Decoding validates every
//! field and never yields a partially built layer.
//!
//! # Example
//!
//! ```
//! use tritium_arena::Pool;
//! use tritium_nn::{ActivationConfig, ChaChaEntropy, Layer};
//!
//! let pool = Pool::with_capacity(1 << 16).unwrap();
//! let layer = Layer::new(&pool, 4, 2, &mut ChaChaEntropy::new(7)).unwrap();
//! let bytes = tritium_model::serialize(&[layer]).unwrap();
//!
//! let restored = tritium_model::deserialize(&bytes, &pool, ActivationConfig::default()).unwrap();
//! assert_eq!(restored[0].input_size(), 4);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod format;

pub use error::ModelError;
pub use format::{deserialize, read_layers, serialize, serialized_len, write_layers};

/// Magic bytes at the start of every model.
pub const MAGIC: [u8; 4] = *b"TRIT";

/// Current binary format version. Only this exact version is accepted.
pub const FORMAT_VERSION: u32 = 1;
