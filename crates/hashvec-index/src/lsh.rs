//! LSH index: random-hyperplane candidate scan plus exact cosine rerank.
//!
//! A query hashes its vector with the persisted hyperplane family, pulls
//! the `limit` entries whose signatures are nearest in Hamming distance,
//! then scores only those with exact cosine similarity. True neighbors
//! whose signatures diverge are missed; that is the recall traded for
//! not touching every stored vector.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use hashvec_storage::Storage;
use hashvec_types::{
    cosine_similarity, Entry, HyperplaneFamily, Metadata, QueryResult, Settings, Signature,
    Vector,
};

use crate::embedder::Embedder;
use crate::error::IndexError;
use crate::index::{IndexStats, VectorStore};

/// Candidates examined when the caller does not pick a limit
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

/// LSH index configuration
#[derive(Debug, Clone)]
pub struct LshConfig {
    /// Vector dimension, fixed when the index is first created
    pub dimension: usize,
    /// RocksDB directory
    pub db_path: PathBuf,
    /// Default candidate count for `query_default`
    pub candidate_limit: usize,
    /// Seed for the hyperplane family of a fresh index (None = random)
    pub seed: Option<u64>,
}

impl LshConfig {
    pub fn new(dimension: usize, db_path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            db_path: db_path.into(),
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            seed: None,
        }
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dimension: settings.dimension,
            db_path: settings.expanded_db_path(),
            candidate_limit: settings.candidate_limit,
            seed: settings.hyperplane_seed,
        }
    }

    fn validate(&self) -> Result<(), IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::Config("dimension must be > 0".to_string()));
        }
        if self.candidate_limit == 0 {
            return Err(IndexError::Config(
                "candidate_limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persistent LSH similarity index.
///
/// Queries take `&self` and run concurrently; inserts are serialized by
/// the storage layer.
pub struct LshIndex {
    storage: Storage,
    family: HyperplaneFamily,
    config: LshConfig,
}

impl LshIndex {
    /// Open or create an index at `path` for vectors of `dimension` components.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self, IndexError> {
        Self::open_with_config(LshConfig::new(dimension, path.as_ref()))
    }

    /// Open an index using layered settings.
    pub fn open_from_settings(settings: &Settings) -> Result<Self, IndexError> {
        settings.validate()?;
        Self::open_with_config(LshConfig::from_settings(settings))
    }

    /// Open or create an index.
    ///
    /// A fresh database gets a newly generated hyperplane family; an
    /// existing one keeps the family it was created with.
    pub fn open_with_config(config: LshConfig) -> Result<Self, IndexError> {
        config.validate()?;

        std::fs::create_dir_all(&config.db_path).map_err(|e| IndexError::StorageUnavailable {
            path: config.db_path.clone(),
            reason: e.to_string(),
        })?;

        // On any error below, `storage` drops and releases the database.
        let storage = Storage::open(&config.db_path)?;
        let family = Self::load_or_create_family(&storage, &config)?;

        info!(
            path = ?config.db_path,
            dim = family.dimension(),
            planes = family.len(),
            "Opened LSH index"
        );

        Ok(Self {
            storage,
            family,
            config,
        })
    }

    fn load_or_create_family(
        storage: &Storage,
        config: &LshConfig,
    ) -> Result<HyperplaneFamily, IndexError> {
        let family = match storage.load_hyperplanes()? {
            Some(family) => {
                debug!(planes = family.len(), "Loaded existing hyperplane family");
                family
            }
            None => {
                let fresh = match config.seed {
                    Some(seed) => HyperplaneFamily::generate_with_seed(config.dimension, seed),
                    None => HyperplaneFamily::generate(config.dimension),
                };
                info!(
                    dim = config.dimension,
                    planes = fresh.len(),
                    "Creating hyperplane family"
                );
                if !storage.persist_hyperplanes(&fresh)? {
                    debug!("Another writer persisted a family first, adopting it");
                }
                // Hash with the stored record so every session agrees bit for bit
                storage.load_hyperplanes()?.ok_or_else(|| {
                    IndexError::Config("hyperplane family vanished after persist".to_string())
                })?
            }
        };

        if family.dimension() != config.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: family.dimension(),
                actual: config.dimension,
            });
        }

        Ok(family)
    }

    /// Vector dimension of this index
    pub fn dimension(&self) -> usize {
        self.family.dimension()
    }

    /// The persisted hyperplane family
    pub fn family(&self) -> &HyperplaneFamily {
        &self.family
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    /// Signature of `vector` under this index's family.
    pub fn signature(&self, vector: &Vector) -> Result<Signature, IndexError> {
        Ok(self.family.signature(vector)?)
    }

    /// Insert a new entry.
    ///
    /// The vector, content and metadata are copied into storage. Vectors
    /// with NaN or infinite components are refused before anything is written.
    pub fn insert(
        &self,
        id: &str,
        vector: &Vector,
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), IndexError> {
        let signature = self.signature(vector)?;
        vector.check_finite()?;
        let entry = Entry::new(id, vector.clone(), content, metadata.clone(), signature);
        self.storage.insert(&entry)?;

        debug!(id = %id, signature = %signature, "Inserted entry");
        Ok(())
    }

    /// Query with the configured default candidate limit.
    pub fn query_default(&self, vector: &Vector) -> Result<Vec<QueryResult>, IndexError> {
        self.query(vector, self.config.candidate_limit)
    }

    /// Return up to `limit` entries ordered by cosine similarity, highest first.
    ///
    /// Candidates are the `limit` nearest signatures by Hamming distance.
    /// A zero-norm stored vector fails the whole query.
    pub fn query(&self, vector: &Vector, limit: usize) -> Result<Vec<QueryResult>, IndexError> {
        vector.check_dimension(self.dimension())?;
        let target = self.signature(vector)?;

        let candidates = self.storage.scan_by_hamming_proximity(target, limit)?;
        debug!(target = %target, candidates = candidates.len(), "Candidate stage complete");

        let mut results = candidates
            .into_iter()
            .map(|(entry, distance)| -> Result<QueryResult, IndexError> {
                let similarity = cosine_similarity(vector.as_slice(), entry.vector.as_slice())?;
                Ok(QueryResult::from_entry(entry, distance, similarity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Stable: equal similarities keep Hamming order
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        debug!(results = results.len(), "Rerank complete");
        Ok(results)
    }

    /// Embed `text` and insert it as the entry content.
    pub fn insert_text<E: Embedder>(
        &self,
        embedder: &E,
        id: &str,
        text: &str,
        metadata: &Metadata,
    ) -> Result<(), IndexError> {
        let vector = embedder
            .embed(text)
            .map_err(|e| IndexError::Embedding(Box::new(e)))?;
        self.insert(id, &vector, text, metadata)
    }

    /// Embed `text` and query with it.
    pub fn query_text<E: Embedder>(
        &self,
        embedder: &E,
        text: &str,
        limit: usize,
    ) -> Result<Vec<QueryResult>, IndexError> {
        let vector = embedder
            .embed(text)
            .map_err(|e| IndexError::Embedding(Box::new(e)))?;
        self.query(&vector, limit)
    }

    /// Get a stored entry by id
    pub fn get(&self, id: &str) -> Result<Option<Entry>, IndexError> {
        Ok(self.storage.get(id)?)
    }

    /// Get index statistics
    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        let storage_stats = self.storage.get_stats()?;
        Ok(IndexStats {
            entry_count: storage_stats.entry_count,
            dimension: self.family.dimension(),
            hyperplanes: self.family.len(),
            disk_usage_bytes: storage_stats.disk_usage_bytes,
        })
    }

    /// Flush and release the database.
    pub fn close(self) -> Result<(), IndexError> {
        info!(path = ?self.config.db_path, "Closing LSH index");
        Ok(self.storage.close()?)
    }
}

impl VectorStore for LshIndex {
    fn dimension(&self) -> usize {
        LshIndex::dimension(self)
    }

    fn insert(
        &self,
        id: &str,
        vector: &Vector,
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), IndexError> {
        LshIndex::insert(self, id, vector, content, metadata)
    }

    fn query(&self, vector: &Vector, limit: usize) -> Result<Vec<QueryResult>, IndexError> {
        LshIndex::query(self, vector, limit)
    }

    fn stats(&self) -> Result<IndexStats, IndexError> {
        LshIndex::stats(self)
    }

    fn close(self) -> Result<(), IndexError> {
        LshIndex::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn v(values: &[f32]) -> Vector {
        Vector::from(values.to_vec())
    }

    fn random_vector(dim: usize) -> Vector {
        use rand::Rng;
        let mut rng = rand::rng();
        Vector::from((0..dim).map(|_| rng.random_range(-1.0..1.0)).collect::<Vec<f32>>())
    }

    fn open_test_index(dim: usize) -> (LshIndex, TempDir) {
        let temp = TempDir::new().unwrap();
        let index = LshIndex::open(temp.path(), dim).unwrap();
        (index, temp)
    }

    #[test]
    fn test_open_creates_family() {
        let (index, _temp) = open_test_index(16);
        assert_eq!(index.dimension(), 16);
        assert_eq!(index.family().len(), 40);
        assert_eq!(index.stats().unwrap().entry_count, 0);
    }

    #[test]
    fn test_rank_by_cosine_similarity() {
        let (index, _temp) = open_test_index(4);
        let empty = Metadata::new();
        index.insert("a", &v(&[1.0, 0.0, 0.0, 0.0]), "alpha", &empty).unwrap();
        index.insert("b", &v(&[0.0, 1.0, 0.0, 0.0]), "beta", &empty).unwrap();
        index.insert("c", &v(&[0.9, 0.1, 0.0, 0.0]), "gamma", &empty).unwrap();

        let results = index.query(&v(&[1.0, 0.0, 0.0, 0.0]), 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);

        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert!((results[1].similarity - 0.9939).abs() < 1e-3);
        assert!(results[2].similarity.abs() < 1e-6);
        assert_eq!(results[0].hamming_distance, 0);
        assert_eq!(results[1].content, "gamma");
    }

    #[test]
    fn test_query_empty_index() {
        let (index, _temp) = open_test_index(8);
        let results = index.query(&random_vector(8), 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let (index, _temp) = open_test_index(8);
        let result = index.query(&random_vector(7), 10);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let (index, _temp) = open_test_index(8);
        let result = index.insert("x", &random_vector(9), "x", &Metadata::new());
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
        assert!(index.get("x").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id() {
        let (index, _temp) = open_test_index(4);
        let mut metadata = Metadata::new();
        metadata.insert("k".to_string(), "v".to_string());
        index.insert("a", &v(&[1.0, 2.0, 3.0, 4.0]), "first", &metadata).unwrap();

        let result = index.insert("a", &v(&[4.0, 3.0, 2.0, 1.0]), "second", &Metadata::new());
        assert!(matches!(result, Err(IndexError::DuplicateId(ref id)) if id == "a"));

        let stored = index.get("a").unwrap().unwrap();
        assert_eq!(stored.content, "first");
        assert_eq!(stored.vector, v(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(stored.metadata.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_degenerate_candidate_fails_query() {
        let (index, _temp) = open_test_index(4);
        index.insert("ok", &v(&[1.0, 0.0, 0.0, 0.0]), "ok", &Metadata::new()).unwrap();
        index.insert("zero", &v(&[0.0; 4]), "zero", &Metadata::new()).unwrap();

        let result = index.query(&v(&[1.0, 0.0, 0.0, 0.0]), 10);
        assert!(matches!(result, Err(IndexError::DegenerateVector)));
    }

    #[test]
    fn test_degenerate_query_vector() {
        let (index, _temp) = open_test_index(4);
        index.insert("ok", &v(&[1.0, 0.0, 0.0, 0.0]), "ok", &Metadata::new()).unwrap();
        let result = index.query(&v(&[0.0; 4]), 10);
        assert!(matches!(result, Err(IndexError::DegenerateVector)));
    }

    #[test]
    fn test_limit_bounds_candidates() {
        let (index, _temp) = open_test_index(32);
        for i in 0..50 {
            index
                .insert(&format!("e{}", i), &random_vector(32), "x", &Metadata::new())
                .unwrap();
        }

        let results = index.query(&random_vector(32), 7).unwrap();
        assert_eq!(results.len(), 7);
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_query_default_uses_configured_limit() {
        let temp = TempDir::new().unwrap();
        let config = LshConfig::new(8, temp.path()).with_candidate_limit(3);
        let index = LshIndex::open_with_config(config).unwrap();
        for i in 0..10 {
            index
                .insert(&format!("e{}", i), &random_vector(8), "x", &Metadata::new())
                .unwrap();
        }
        assert_eq!(index.query_default(&random_vector(8)).unwrap().len(), 3);
    }

    #[test]
    fn test_reopen_reuses_family() {
        let temp = TempDir::new().unwrap();
        let sample = random_vector(24);

        let (before, family) = {
            let index = LshIndex::open(temp.path(), 24).unwrap();
            index.insert("p", &sample, "sample", &Metadata::new()).unwrap();
            let sig = index.signature(&sample).unwrap();
            let family = index.family().clone();
            index.close().unwrap();
            (sig, family)
        };

        let index = LshIndex::open(temp.path(), 24).unwrap();
        assert_eq!(index.signature(&sample).unwrap(), before);
        assert_eq!(index.family(), &family);
        assert_eq!(index.get("p").unwrap().unwrap().signature, before);

        let results = index.query(&sample, 1).unwrap();
        assert_eq!(results[0].id, "p");
        assert_eq!(results[0].hamming_distance, 0);
    }

    #[test]
    fn test_first_session_signatures_match_reopened_session() {
        let temp = TempDir::new().unwrap();
        let dim = 32;
        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();

        let (family, before, edge) = {
            let index =
                LshIndex::open_with_config(LshConfig::new(dim, temp.path()).with_seed(8)).unwrap();

            // Vectors lying almost on one plane each, so the bit for that
            // plane hinges on the last bits of its components
            let edge: Vec<Vector> = index
                .family()
                .planes()
                .iter()
                .enumerate()
                .map(|(k, plane)| {
                    let base: Vec<f64> =
                        (0..dim).map(|i| ((i * 7 + k * 3) as f64).sin()).collect();
                    let scale = dot(&base, plane) / dot(plane, plane);
                    Vector::from(
                        base.iter()
                            .zip(plane)
                            .map(|(b, p)| (b - scale * p) as f32)
                            .collect::<Vec<_>>(),
                    )
                })
                .collect();

            let sigs: Vec<Signature> = edge.iter().map(|v| index.signature(v).unwrap()).collect();
            let family = index.family().clone();
            index.close().unwrap();
            (family, sigs, edge)
        };

        let index = LshIndex::open(temp.path(), dim).unwrap();
        let after: Vec<Signature> = edge.iter().map(|v| index.signature(v).unwrap()).collect();
        assert_eq!(after, before);

        for (got, want) in index
            .family()
            .planes()
            .iter()
            .flatten()
            .zip(family.planes().iter().flatten())
        {
            assert_eq!(got.to_bits(), want.to_bits());
        }
    }

    #[test]
    fn test_non_finite_insert_writes_nothing() {
        let (index, _temp) = open_test_index(3);
        index.insert("ok", &v(&[1.0, 0.0, 0.0]), "fine", &Metadata::new()).unwrap();

        for bad in [
            v(&[f32::NAN, 1.0, 0.0]),
            v(&[0.0, f32::INFINITY, 0.0]),
            v(&[0.0, 0.0, f32::NEG_INFINITY]),
        ] {
            let result = index.insert("bad", &bad, "broken", &Metadata::new());
            assert!(matches!(result, Err(IndexError::NonFiniteVector { .. })));
        }

        assert!(index.get("bad").unwrap().is_none());
        assert_eq!(index.stats().unwrap().entry_count, 1);

        let results = index.query(&v(&[1.0, 0.0, 0.0]), 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ok");
    }

    #[test]
    fn test_reopen_with_other_dimension_fails() {
        let temp = TempDir::new().unwrap();
        LshIndex::open(temp.path(), 8).unwrap().close().unwrap();

        let result = LshIndex::open(temp.path(), 16);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 8,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_seeded_indexes_share_family() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let ia = LshIndex::open_with_config(LshConfig::new(12, a.path()).with_seed(99)).unwrap();
        let ib = LshIndex::open_with_config(LshConfig::new(12, b.path()).with_seed(99)).unwrap();
        assert_eq!(ia.family(), ib.family());
    }

    #[test]
    fn test_invalid_config() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            LshIndex::open(temp.path(), 0),
            Err(IndexError::Config(_))
        ));
        assert!(matches!(
            LshIndex::open_with_config(LshConfig::new(4, temp.path()).with_candidate_limit(0)),
            Err(IndexError::Config(_))
        ));
    }

    #[test]
    fn test_open_unavailable_path() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("occupied");
        std::fs::write(&file_path, b"not a directory").unwrap();

        let result = LshIndex::open(&file_path, 4);
        assert!(matches!(result, Err(IndexError::StorageUnavailable { .. })));
    }

    #[test]
    fn test_open_while_locked_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let _held = LshIndex::open(temp.path(), 4).unwrap();
        let result = LshIndex::open(temp.path(), 4);
        assert!(matches!(result, Err(IndexError::StorageUnavailable { .. })));
    }

    #[test]
    fn test_stats() {
        let (index, _temp) = open_test_index(4);
        index.insert("a", &v(&[1.0, 0.0, 0.0, 0.0]), "a", &Metadata::new()).unwrap();
        let stats = index.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.dimension, 4);
        assert_eq!(stats.hyperplanes, 20);
    }

    #[derive(Debug)]
    struct EmbedFailed;

    impl std::fmt::Display for EmbedFailed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "embedder offline")
        }
    }

    impl std::error::Error for EmbedFailed {}

    /// Counts letters a-d into a 4-dimensional vector.
    struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        type Error = EmbedFailed;

        fn embed(&self, text: &str) -> Result<Vector, Self::Error> {
            if text.is_empty() {
                return Err(EmbedFailed);
            }
            let mut counts = [0.0f32; 4];
            for c in text.chars() {
                if let Some(i) = "abcd".find(c) {
                    counts[i] += 1.0;
                }
            }
            Ok(Vector::from(counts.to_vec()))
        }
    }

    #[test]
    fn test_text_helpers() {
        let (index, _temp) = open_test_index(4);
        let embedder = LetterEmbedder;
        index.insert_text(&embedder, "1", "aaaa", &Metadata::new()).unwrap();
        index.insert_text(&embedder, "2", "dddd", &Metadata::new()).unwrap();

        let results = index.query_text(&embedder, "aaab", 10).unwrap();
        assert_eq!(results[0].id, "1");
        assert_eq!(results[0].content, "aaaa");

        let err = index.query_text(&embedder, "", 10).unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
        assert!(err.to_string().contains("embedder offline"));
    }

    #[test]
    fn test_vector_store_generic_usage() {
        fn roundtrip<S: VectorStore>(store: S) -> Result<usize, IndexError> {
            store.insert("t", &Vector::from(vec![0.5, 0.5]), "t", &Metadata::new())?;
            let n = store.query(&Vector::from(vec![1.0, 1.0]), 5)?.len();
            store.close()?;
            Ok(n)
        }

        let temp = TempDir::new().unwrap();
        let index = LshIndex::open(temp.path(), 2).unwrap();
        assert_eq!(roundtrip(index).unwrap(), 1);
    }
}
