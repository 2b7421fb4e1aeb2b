//! Dense float vectors and cosine similarity.

use serde::{Deserialize, Serialize};

use crate::error::VectorError;

/// A dense embedding vector.
///
/// Unlike a normalized embedding, the components are kept exactly as the
/// caller supplied them; norms are computed when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector(Vec<f32>);

impl Vector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of components
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Fail with `DimensionMismatch` unless this vector has `expected` components.
    pub fn check_dimension(&self, expected: usize) -> Result<(), VectorError> {
        if self.0.len() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    /// Fail with `NonFinite` at the first NaN or infinite component.
    pub fn check_finite(&self) -> Result<(), VectorError> {
        match self.0.iter().position(|x| !x.is_finite()) {
            Some(position) => Err(VectorError::NonFinite { position }),
            None => Ok(()),
        }
    }

    /// Dot product against a hyperplane normal, accumulated in f64.
    pub(crate) fn dot_f64(&self, plane: &[f64]) -> f64 {
        self.0
            .iter()
            .zip(plane.iter())
            .map(|(&v, &p)| f64::from(v) * p)
            .sum()
    }

    /// Cosine similarity with another vector.
    pub fn cosine_similarity(&self, other: &Vector) -> Result<f32, VectorError> {
        cosine_similarity(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Cosine of the angle between `a` and `b`, in `[-1, 1]`.
///
/// Sums are accumulated in f64 so long vectors do not drift.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VectorError::DegenerateVector);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}
