//! Core types for the Tritium ternary tensor engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the three-valued logic domain ([`Trit`]), the confidence algebra that
//! travels alongside it, tensor [`Shape`]s, and the error taxonomy shared
//! by every other crate in the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod confidence;
pub mod error;
pub mod shape;
pub mod trit;

pub use error::{ErrorKind, TernaryError};
pub use shape::{Shape, MAX_DIMS};
pub use trit::Trit;
