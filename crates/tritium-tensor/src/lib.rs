//! Pool-backed ternary tensors and batched Kleene operators.
//!
//! A [`Tensor`] is a struct-of-arrays of values ([`Trit`](tritium_core::Trit)),
//! confidences and gradients laid out in one block of a
//! [`Pool`](tritium_arena::Pool):
//!
//! ```text
//! block offset 0          aligned                 aligned
//! ├── values: i8 × n ──┤  ├── confidence: f64 × n ──┤  ├── gradient: f64 × n ──┤
//! ```
//!
//! The batched operators in [`ops`] apply Kleene logic elementwise and
//! propagate confidence alongside. They dispatch through a [`Kernels`]
//! strategy chosen once per process (see [`backend`]).
//!
//! # Example
//!
//! ```
//! use tritium_arena::Pool;
//! use tritium_core::Trit;
//! use tritium_tensor::{ops, Tensor};
//!
//! let pool = Pool::with_capacity(1 << 16).unwrap();
//! let mut a = Tensor::new(&pool, &[2]).unwrap();
//! a.fill(&[Trit::True, Trit::False], &[0.5, 1.0]).unwrap();
//!
//! let mut out = Tensor::new(&pool, &[2]).unwrap();
//! ops::batch_and(&mut out, &a, &a).unwrap();
//! assert_eq!(out.value(0), Trit::True);
//! assert_eq!(out.confidence(0), 0.25);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod ops;
pub mod tensor;

pub use backend::{kernels, Backend, ChunkedKernels, Kernels, LogicOp, ScalarKernels};
pub use ops::{
    batch_all, batch_and, batch_and_assign, batch_any, batch_not, batch_not_in_place, batch_or,
    batch_or_assign,
};
pub use tensor::{ConfidenceMut, Tensor, TensorPartsMut, TritsMut};
