//! Storage layer for the hashvec index.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for entries, the signature index and index metadata
//! - Signature-prefixed keys so the proximity scan never decodes vectors
//! - Atomic inserts via WriteBatch (entry + signature index + sequence)
//! - A write-once hyperplane family record

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{SignatureKey, StoredEntry};
