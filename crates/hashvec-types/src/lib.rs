//! # hashvec-types
//!
//! Shared domain types for the hashvec similarity index.
//!
//! This crate defines the core data structures used throughout the system:
//! - Vectors: fixed-dimension float sequences with cosine similarity
//! - Signatures: 64-bit LSH fingerprints and the Hamming distance primitive
//! - Hyperplane families: random projections that turn vectors into signatures
//! - Entries and results: what the index stores and what queries return
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use hashvec_types::{HyperplaneFamily, Vector};
//!
//! let family = HyperplaneFamily::generate_with_seed(4, 7);
//! let sig = family.signature(&Vector::from(vec![1.0, 0.0, 0.0, 0.0])).unwrap();
//! assert_eq!(sig, family.signature(&Vector::from(vec![1.0, 0.0, 0.0, 0.0])).unwrap());
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod hyperplane;
pub mod signature;
pub mod vector;

pub use config::Settings;
pub use entry::{Entry, Metadata, QueryResult};
pub use error::VectorError;
pub use hyperplane::{hyperplane_count, HyperplaneFamily, MAX_HYPERPLANES};
pub use signature::{hamming, Signature};
pub use vector::{cosine_similarity, Vector};
