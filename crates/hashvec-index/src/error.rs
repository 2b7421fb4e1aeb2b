//! Index error types.

use std::path::PathBuf;

use thiserror::Error;

use hashvec_storage::StorageError;
use hashvec_types::VectorError;

/// Errors returned to index callers.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Vector length does not match the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An entry with this id already exists
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Zero-norm vector met during similarity computation
    #[error("Degenerate vector: zero norm has no direction")]
    DegenerateVector,

    /// Vector has a NaN or infinite component
    #[error("Non-finite vector component at position {position}")]
    NonFiniteVector { position: usize },

    /// Storage could not be opened or initialized
    #[error("Storage unavailable at {path:?}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    /// Storage read/write failed after open
    #[error("Storage I/O error: {0}")]
    StorageIo(#[source] StorageError),

    /// Invalid index configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The external embedder failed
    #[error("Embedding error: {0}")]
    Embedding(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StorageError> for IndexError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable { path, source } => IndexError::StorageUnavailable {
                path,
                reason: source.to_string(),
            },
            StorageError::DuplicateId(id) => IndexError::DuplicateId(id),
            other => IndexError::StorageIo(other),
        }
    }
}

impl From<VectorError> for IndexError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { expected, actual } => {
                IndexError::DimensionMismatch { expected, actual }
            }
            VectorError::DegenerateVector => IndexError::DegenerateVector,
            VectorError::NonFinite { position } => IndexError::NonFiniteVector { position },
            VectorError::InvalidFamily(msg) | VectorError::Config(msg) => IndexError::Config(msg),
            VectorError::Serialization(e) => IndexError::Serialization(e.to_string()),
        }
    }
}
