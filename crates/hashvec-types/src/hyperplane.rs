//! Random-hyperplane LSH family.
//!
//! Each hyperplane is a direction with independent standard-normal
//! components. A vector's signature records which side of every plane it
//! falls on, so vectors separated by a small angle share most bits.
//!
//! The family must outlive every signature computed from it: signatures
//! from two different families are not comparable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::VectorError;
use crate::signature::Signature;
use crate::vector::Vector;

/// Upper bound on planes; a signature is one 64-bit word.
pub const MAX_HYPERPLANES: usize = 64;

/// Number of hyperplanes for a given dimension: `min(64, round(10 * log2(dim)))`, at least 1.
pub fn hyperplane_count(dimension: usize) -> usize {
    if dimension <= 1 {
        return 1;
    }
    let planes = (10.0 * (dimension as f64).log2()).round() as usize;
    planes.clamp(1, MAX_HYPERPLANES)
}

/// A fixed, ordered set of hyperplane normals for one index dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperplaneFamily {
    /// Length of every plane (and of every vector hashed by it)
    dimension: usize,
    /// Plane normals, bit `i` of a signature comes from `planes[i]`
    planes: Vec<Vec<f64>>,
}

impl HyperplaneFamily {
    /// Generate a fresh family from a non-deterministic seed.
    pub fn generate(dimension: usize) -> Self {
        Self::generate_from(dimension, &mut rand::rng())
    }

    /// Generate a reproducible family from a fixed seed.
    pub fn generate_with_seed(dimension: usize, seed: u64) -> Self {
        Self::generate_from(dimension, &mut StdRng::seed_from_u64(seed))
    }

    fn generate_from<R: Rng>(dimension: usize, rng: &mut R) -> Self {
        let count = hyperplane_count(dimension);
        let planes = (0..count)
            .map(|_| {
                (0..dimension)
                    .map(|_| rng.sample::<f64, _>(StandardNormal))
                    .collect()
            })
            .collect();
        Self { dimension, planes }
    }

    /// Build a family from explicit planes, validating shape.
    pub fn from_planes(dimension: usize, planes: Vec<Vec<f64>>) -> Result<Self, VectorError> {
        let family = Self { dimension, planes };
        family.validate()?;
        Ok(family)
    }

    fn validate(&self) -> Result<(), VectorError> {
        if self.planes.is_empty() || self.planes.len() > MAX_HYPERPLANES {
            return Err(VectorError::InvalidFamily(format!(
                "expected 1..={} planes, found {}",
                MAX_HYPERPLANES,
                self.planes.len()
            )));
        }
        if let Some(bad) = self.planes.iter().find(|p| p.len() != self.dimension) {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of planes, which is also the signature width in bits
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn planes(&self) -> &[Vec<f64>] {
        &self.planes
    }

    /// Hash a vector to its signature.
    ///
    /// A dot product of exactly zero leaves the bit clear.
    pub fn signature(&self, vector: &Vector) -> Result<Signature, VectorError> {
        vector.check_dimension(self.dimension)?;

        let bits = self
            .planes
            .iter()
            .enumerate()
            .filter(|(_, plane)| vector.dot_f64(plane) > 0.0)
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i));

        Ok(Signature::new(bits))
    }

    /// Serialize to JSON bytes for storage.
    ///
    /// Components must decode to the same bits, so `serde_json` is built
    /// with `float_roundtrip`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VectorError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes, rejecting malformed families.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VectorError> {
        let family: Self = serde_json::from_slice(bytes)?;
        family.validate()?;
        Ok(family)
    }
}
