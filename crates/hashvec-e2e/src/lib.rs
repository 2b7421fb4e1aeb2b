//! End-to-end test infrastructure for hashvec.
//!
//! Provides a shared TestHarness and helpers for tests covering the
//! open -> insert -> query -> close -> reopen lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Once;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hashvec_index::{IndexError, LshConfig, LshIndex};
use hashvec_types::{Metadata, Vector};

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary.
///
/// Honors RUST_LOG, falling back to `warn` so test output stays quiet.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Shared test harness for E2E tests.
///
/// Owns a temp directory; the index lives in a subdirectory so tests can
/// close and reopen it.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Path of the index database
    pub index_path: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with an empty temp directory.
    pub fn new() -> Self {
        init_tracing();
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_path = temp_dir.path().join("index");

        Self {
            _temp_dir: temp_dir,
            index_path,
        }
    }

    /// Open (or reopen) the harness index.
    pub fn open(&self, dimension: usize) -> Result<LshIndex, IndexError> {
        LshIndex::open(&self.index_path, dimension)
    }

    /// Open with a custom configuration rooted at the harness path.
    pub fn open_with(
        &self,
        dimension: usize,
        configure: impl FnOnce(LshConfig) -> LshConfig,
    ) -> Result<LshIndex, IndexError> {
        LshIndex::open_with_config(configure(LshConfig::new(dimension, &self.index_path)))
    }

    pub fn path(&self) -> &Path {
        &self.index_path
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a vector from a slice literal.
pub fn vector(values: &[f32]) -> Vector {
    Vector::from(values.to_vec())
}

/// Build metadata from key/value pairs.
pub fn metadata(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Deterministic random vectors with components in [-1, 1).
pub fn random_vectors(count: usize, dimension: usize, seed: u64) -> Vec<Vector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Vector::from(
                (0..dimension)
                    .map(|_| rng.random_range(-1.0f32..1.0))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// Insert vectors as `item-{n}` with content `content-{n}`.
pub fn insert_all(index: &LshIndex, vectors: &[Vector]) -> anyhow::Result<()> {
    for (i, v) in vectors.iter().enumerate() {
        index.insert(
            &format!("item-{}", i),
            v,
            &format!("content-{}", i),
            &metadata(&[("ordinal", i.to_string().as_str())]),
        )?;
    }
    Ok(())
}

/// Exact top-k ids by cosine similarity, the reference the LSH index approximates.
pub fn brute_force_top_k(vectors: &[Vector], query: &Vector, k: usize) -> Vec<String> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .filter_map(|(i, v)| query.cosine_similarity(v).ok().map(|s| (i, s)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(k)
        .map(|(i, _)| format!("item-{}", i))
        .collect()
}
