//! # hashvec-index
//!
//! Approximate nearest-neighbor index using random-hyperplane LSH.
//!
//! Entries are stored in RocksDB together with a 64-bit signature. A query
//! pulls the entries whose signatures are closest in Hamming distance and
//! reranks just those by exact cosine similarity.
//!
//! ## Features
//! - Hyperplane family generated once per index and persisted
//! - Bounded candidate scan over a compact signature index
//! - Exact cosine rerank of the candidate set
//! - `Embedder` boundary for text-in, text-out callers
//!
//! ```no_run
//! use hashvec_index::LshIndex;
//! use hashvec_types::{Metadata, Vector};
//!
//! let index = LshIndex::open("/tmp/hashvec-demo", 4)?;
//! index.insert("a", &Vector::from(vec![1.0, 0.0, 0.0, 0.0]), "alpha", &Metadata::new())?;
//! let hits = index.query(&Vector::from(vec![1.0, 0.0, 0.0, 0.0]), 10)?;
//! assert_eq!(hits[0].id, "a");
//! index.close()?;
//! # Ok::<(), hashvec_index::IndexError>(())
//! ```

pub mod embedder;
pub mod error;
pub mod index;
pub mod lsh;

pub use embedder::Embedder;
pub use error::IndexError;
pub use index::{IndexStats, VectorStore};
pub use lsh::{LshConfig, LshIndex, DEFAULT_CANDIDATE_LIMIT};
