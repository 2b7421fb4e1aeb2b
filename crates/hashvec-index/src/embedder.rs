//! Boundary to the external embedding model.
//!
//! The index never computes embeddings. Callers that work with text plug an
//! [`Embedder`] in and use the `*_text` helpers on [`crate::LshIndex`].

use hashvec_types::Vector;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
pub trait Embedder: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate the vector for a single text.
    fn embed(&self, text: &str) -> Result<Vector, Self::Error>;

    /// Generate vectors for multiple texts.
    /// Default implementation calls embed() for each text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>, Self::Error> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
