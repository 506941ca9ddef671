//! Tritium: a ternary tensor engine for uncertainty-aware learning.
//!
//! Every tensor element carries a discrete state (TRUE / FALSE / UNKNOWN),
//! a confidence in `[0, 1]` and a gradient. Tensors live in a
//! fixed-capacity [`Pool`](arena::Pool), combine through batched Kleene
//! operators, and feed small fully connected layers trained by adjusting
//! confidences.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tritium sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use tritium::prelude::*;
//!
//! let pool = Pool::new(PoolConfig::new(1 << 20)).unwrap();
//!
//! // Kleene AND with confidence propagation.
//! let mut a = Tensor::new(&pool, &[2, 2]).unwrap();
//! a.fill(&[Trit::True, Trit::False, Trit::Unknown, Trit::True], &[1.0, 1.0, 0.5, 0.8])
//!     .unwrap();
//! let mut out = Tensor::new(&pool, &[2, 2]).unwrap();
//! batch_and(&mut out, &a, &a).unwrap();
//! assert_eq!(out.value(3), Trit::True);
//! assert!((out.confidence(3) - 0.64).abs() < 1e-9);
//!
//! // A seeded layer, one forward pass and one update step.
//! let layer = Layer::new(&pool, 2, 3, &mut ChaChaEntropy::new(42)).unwrap();
//! let mut y = layer.forward(&a).unwrap();
//! assert_eq!(y.dims(), &[2, 3]);
//! let step = compute_gradients(&mut y, &[1.0; 6], 0.1, &GradientConfig::default()).unwrap();
//! assert!(step.loss.is_finite());
//!
//! // Save and restore.
//! let bytes = tritium::model::serialize(&[layer]).unwrap();
//! let restored = tritium::model::deserialize(&bytes, &pool, ActivationConfig::default()).unwrap();
//! assert_eq!(restored[0].output_size(), 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tritium-core` | `Trit`, confidence algebra, `Shape`, errors |
//! | [`arena`] | `tritium-arena` | `Pool`, `Block`, pool statistics |
//! | [`tensor`] | `tritium-tensor` | `Tensor`, batched operators, kernel backends |
//! | [`nn`] | `tritium-nn` | Entropy sources, activation, `Layer`, gradients |
//! | [`model`] | `tritium-model` | Binary model format |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ternary domain, confidence algebra, shapes and errors (`tritium-core`).
pub use tritium_core as types;

/// Fixed-capacity pooled allocation (`tritium-arena`).
///
/// [`arena::Pool`] is `Sync`; its blocks may be freed from any thread.
pub use tritium_arena as arena;

/// Pool-backed tensors and batched operators (`tritium-tensor`).
///
/// The kernel backend is chosen once per process; see
/// [`tensor::backend::Backend::detect`].
pub use tritium_tensor as tensor;

/// Layers, activation, entropy sources and gradients (`tritium-nn`).
pub use tritium_nn as nn;

/// Binary model format (`tritium-model`).
pub use tritium_model as model;

/// Common imports for typical Tritium usage.
///
/// ```rust
/// use tritium::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tritium_core::{confidence, ErrorKind, Shape, TernaryError, Trit};

    // Allocation
    pub use tritium_arena::{Pool, PoolConfig, PoolError, PoolStats};

    // Tensors and operators
    pub use tritium_tensor::{
        batch_all, batch_and, batch_and_assign, batch_any, batch_not, batch_not_in_place,
        batch_or, batch_or_assign, Tensor,
    };

    // Layers and training
    pub use tritium_nn::{
        compute_gradients, ActivationConfig, ChaChaEntropy, EntropySource, GradientConfig,
        GradientStep, Layer, LayerConfig, LossKind,
    };

    // Serialization
    pub use tritium_model::ModelError;
}
