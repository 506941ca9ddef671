//! Ternary neural-network layers for Tritium.
//!
//! A [`Layer`] holds `[output, input]` weights and an `[output]` bias,
//! both ternary tensors with confidences. The forward pass computes a
//! confidence-weighted sum per output unit and re-quantizes it with an
//! [`ActivationConfig`]. Training adjusts confidences with
//! [`compute_gradients`] and flips values when a confidence collapses.
//!
//! Randomness enters only at layer creation, through an injected
//! [`EntropySource`].
//!
//! # Example
//!
//! ```
//! use tritium_arena::Pool;
//! use tritium_nn::{compute_gradients, ChaChaEntropy, GradientConfig, Layer};
//! use tritium_tensor::Tensor;
//!
//! let pool = Pool::with_capacity(1 << 16).unwrap();
//! let layer = Layer::new(&pool, 4, 2, &mut ChaChaEntropy::new(42)).unwrap();
//!
//! let input = Tensor::new(&pool, &[3, 4]).unwrap();
//! let mut out = layer.forward(&input).unwrap();
//! assert_eq!(out.dims(), &[3, 2]);
//!
//! let target = [1.0; 6];
//! let step = compute_gradients(&mut out, &target, 0.1, &GradientConfig::default()).unwrap();
//! assert!(step.loss >= 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod activation;
pub mod config;
pub mod entropy;
pub mod gradient;
pub mod layer;

pub use activation::ActivationConfig;
pub use config::{GradientConfig, LayerConfig, LossKind};
pub use entropy::{ChaChaEntropy, EntropySource};
pub use gradient::{compute_gradients, loss, GradientStep};
pub use layer::{sample_trit, Layer};
