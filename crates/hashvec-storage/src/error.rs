//! Storage layer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database at `path` could not be opened or initialized
    #[error("Storage unavailable at {path:?}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rocksdb::Error,
    },

    /// RocksDB read/write failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// An entry with this id is already stored
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Key encoding/decoding error
    #[error("Key error: {0}")]
    Key(String),

    /// Persisted record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<hashvec_types::VectorError> for StorageError {
    fn from(err: hashvec_types::VectorError) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}
