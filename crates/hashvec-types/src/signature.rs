//! LSH signatures and the Hamming distance primitive.
//!
//! A signature is an unsigned 64-bit word. Storage engines without an
//! unsigned 64-bit column see it only as raw bits: `to_storage_bits` and
//! `from_storage_bits` reinterpret the bit pattern and never convert the
//! numeric value, so the high bit can't be sign-extended or clamped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bit `i` is set when the vector lies on the positive side of hyperplane `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(u64);

impl Signature {
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Bit pattern as a signed storage cell.
    pub const fn to_storage_bits(self) -> i64 {
        i64::from_ne_bytes(self.0.to_ne_bytes())
    }

    /// Inverse of [`Signature::to_storage_bits`].
    pub const fn from_storage_bits(cell: i64) -> Self {
        Self(u64::from_ne_bytes(cell.to_ne_bytes()))
    }

    /// Big-endian bytes, used as an ordered key prefix.
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    pub fn is_set(self, bit: usize) -> bool {
        bit < 64 && self.0 & (1u64 << bit) != 0
    }

    /// Hamming distance to `other`.
    pub fn distance(self, other: Signature) -> u32 {
        hamming(self, other)
    }
}

impl From<u64> for Signature {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Number of differing bits between two signatures.
///
/// Compiles to a single popcount instruction where the target has one.
#[inline]
pub fn hamming(a: Signature, b: Signature) -> u32 {
    (a.0 ^ b.0).count_ones()
}
