//! Key and record encoding for the storage layer.
//!
//! Signature index key format: `{signature:8 BE}{sequence:8 BE}`
//! - signature: raw LSH bits, big-endian so keys sort by signature
//! - sequence: insertion counter, orders entries sharing a signature
//!
//! Entry records are JSON. The signature is written as a signed 64-bit
//! cell holding the raw bit pattern and reinterpreted on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hashvec_types::{Entry, Metadata, Signature, Vector};

use crate::error::StorageError;

/// Length of an encoded [`SignatureKey`]
pub const SIGNATURE_KEY_LEN: usize = 16;

/// Key for the signature secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SignatureKey {
    pub signature: Signature,
    /// Monotonic insertion sequence
    pub sequence: u64,
}

impl SignatureKey {
    pub fn new(signature: Signature, sequence: u64) -> Self {
        Self {
            signature,
            sequence,
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> [u8; SIGNATURE_KEY_LEN] {
        let mut key = [0u8; SIGNATURE_KEY_LEN];
        key[..8].copy_from_slice(&self.signature.to_be_bytes());
        key[8..].copy_from_slice(&self.sequence.to_be_bytes());
        key
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() != SIGNATURE_KEY_LEN {
            return Err(StorageError::Key(format!(
                "Invalid signature key length: {}",
                bytes.len()
            )));
        }
        let mut sig = [0u8; 8];
        let mut seq = [0u8; 8];
        sig.copy_from_slice(&bytes[..8]);
        seq.copy_from_slice(&bytes[8..]);
        Ok(Self {
            signature: Signature::from_be_bytes(sig),
            sequence: u64::from_be_bytes(seq),
        })
    }
}

/// Entry record as persisted in the entries column family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub vector: Vector,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Raw signature bits in a signed cell, see [`Signature::to_storage_bits`]
    pub signature: i64,
    pub created_at: DateTime<Utc>,
    pub sequence: u64,
}

impl StoredEntry {
    pub fn from_entry(entry: &Entry, sequence: u64) -> Self {
        Self {
            vector: entry.vector.clone(),
            content: entry.content.clone(),
            metadata: entry.metadata.clone(),
            signature: entry.signature.to_storage_bits(),
            created_at: entry.created_at,
            sequence,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::from_storage_bits(self.signature)
    }

    pub fn into_entry(self, id: impl Into<String>) -> Entry {
        let signature = self.signature();
        Entry {
            id: id.into(),
            vector: self.vector,
            content: self.content,
            metadata: self.metadata,
            signature,
            created_at: self.created_at,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Encode the next-sequence counter
pub fn encode_sequence(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}

/// Decode the next-sequence counter
pub fn decode_sequence(bytes: &[u8]) -> Result<u64, StorageError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::Corrupt(format!("sequence of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}
