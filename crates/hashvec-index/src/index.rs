//! Vector store trait and types.
//!
//! Defines the interface for inserting and querying vectors.

use serde::Serialize;

use hashvec_types::{Metadata, QueryResult, Vector};

use crate::error::IndexError;

/// Index statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    /// Number of stored entries
    pub entry_count: u64,
    /// Vector dimension
    pub dimension: usize,
    /// Number of hyperplanes (signature width in bits)
    pub hyperplanes: usize,
    /// Database size on disk in bytes
    pub disk_usage_bytes: u64,
}

/// Trait for persistent vector stores.
///
/// Implementations must be safe for concurrent queries. Inserts may be
/// serialized internally.
pub trait VectorStore: Send + Sync {
    /// Get the vector dimension
    fn dimension(&self) -> usize;

    /// Insert a new entry. Ids are unique; there is no overwrite.
    fn insert(
        &self,
        id: &str,
        vector: &Vector,
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), IndexError>;

    /// Return up to `limit` entries, most similar first.
    fn query(&self, vector: &Vector, limit: usize) -> Result<Vec<QueryResult>, IndexError>;

    /// Get index statistics
    fn stats(&self) -> Result<IndexStats, IndexError>;

    /// Flush and release underlying storage
    fn close(self) -> Result<(), IndexError>
    where
        Self: Sized;
}
