//! Error types for the model format.

use std::fmt;
use std::io;

use tritium_core::{ErrorKind, TernaryError};

/// Errors that can occur while encoding or decoding a model.
#[derive(Debug)]
pub enum ModelError {
    /// An I/O error other than end-of-input occurred.
    Io(io::Error),
    /// The stream does not start with `b"TRIT"`.
    InvalidMagic {
        /// The four bytes found instead.
        found: [u8; 4],
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u32,
    },
    /// The stream ended before the declared content.
    Truncated,
    /// The stream is complete but its content is invalid.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// Rebuilding a layer failed, typically because the pool is full.
    Tensor(TernaryError),
}

impl ModelError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    /// Coarse category: [`ErrorKind::SerializationError`] for format and
    /// I/O problems, the wrapped error's kind for [`ModelError::Tensor`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Tensor(e) => e.kind(),
            _ => ErrorKind::SerializationError,
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic { found } => {
                write!(f, "invalid magic bytes {found:02x?} (expected b\"TRIT\")")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported model format version {found}")
            }
            Self::Truncated => write!(f, "model data ends unexpectedly"),
            Self::Malformed { detail } => write!(f, "malformed model: {detail}"),
            Self::Tensor(e) => write!(f, "cannot rebuild layer: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Tensor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ModelError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

impl From<TernaryError> for ModelError {
    fn from(e: TernaryError) -> Self {
        Self::Tensor(e)
    }
}
