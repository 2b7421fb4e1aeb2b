//! Error types for vector math and configuration.

use thiserror::Error;

/// Errors raised by the shared vector types.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Vector length does not match the expected dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Zero-norm vector, cosine similarity is undefined
    #[error("Degenerate vector: zero norm has no direction")]
    DegenerateVector,

    /// NaN or infinite component, which has no JSON encoding
    #[error("Non-finite component at position {position}")]
    NonFinite { position: usize },

    /// Hyperplane family failed validation
    #[error("Invalid hyperplane family: {0}")]
    InvalidFamily(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
