//! Stored entries and query results.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signature::Signature;
use crate::vector::Vector;

/// Free-form string metadata attached to an entry.
pub type Metadata = HashMap<String, String>;

/// An immutable indexed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Caller-chosen unique key
    pub id: String,
    pub vector: Vector,
    /// Opaque payload, usually the text that was embedded
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// LSH signature of `vector` under the index's hyperplane family
    pub signature: Signature,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        id: impl Into<String>,
        vector: Vector,
        content: impl Into<String>,
        metadata: Metadata,
        signature: Signature,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            content: content.into(),
            metadata,
            signature,
            created_at: Utc::now(),
        }
    }
}

/// One ranked hit returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub vector: Vector,
    pub content: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    /// Bits differing from the query signature (candidate stage)
    pub hamming_distance: u32,
    /// Exact cosine similarity to the query vector (rerank stage)
    pub similarity: f32,
}

impl QueryResult {
    /// Build a result from a candidate entry and its scores.
    pub fn from_entry(entry: Entry, hamming_distance: u32, similarity: f32) -> Self {
        Self {
            id: entry.id,
            vector: entry.vector,
            content: entry.content,
            metadata: entry.metadata,
            created_at: entry.created_at,
            hamming_distance,
            similarity,
        }
    }
}
