//! RocksDB wrapper for hashvec storage.
//!
//! Provides:
//! - Database open/close with column family setup
//! - Atomic inserts (entry + signature index + sequence counter)
//! - The write-once hyperplane family record
//! - Hamming-proximity scans over the signature index

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rocksdb::{ColumnFamily, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info, warn};

use hashvec_types::{hamming, Entry, HyperplaneFamily, Signature};

use crate::column_families::{
    build_cf_descriptors, ALL_CF_NAMES, CF_ENTRIES, CF_INDEX_META, CF_SIGNATURES,
    META_HYPERPLANES, META_NEXT_SEQUENCE,
};
use crate::error::StorageError;
use crate::keys::{decode_sequence, encode_sequence, SignatureKey, StoredEntry};

/// Main storage interface for one index
pub struct Storage {
    db: DB,
    /// Sequence assigned to the next inserted entry.
    ///
    /// Every write holds this lock, so the duplicate check, batch write and
    /// counter bump of an insert happen as one step.
    next_sequence: Mutex<u64>,
}

/// A candidate under consideration during a proximity scan.
///
/// Ordered by (distance, sequence) so the heap top is the worst candidate.
#[derive(Debug, PartialEq, Eq)]
struct Candidate {
    distance: u32,
    sequence: u64,
    id: Box<[u8]>,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.distance, self.sequence).cmp(&(other.distance, other.sequence))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Storage {
    /// Open storage at the given path, creating if necessary.
    ///
    /// If anything fails after RocksDB opens, the handle is dropped before
    /// the error is returned, releasing the lock file.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        // Append-only workload
        db_opts.set_compaction_style(rocksdb::DBCompactionStyle::Universal);
        db_opts.set_max_background_jobs(4);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors()).map_err(
            |source| StorageError::Unavailable {
                path: path.to_path_buf(),
                source,
            },
        )?;

        let next_sequence = Self::load_next_sequence(&db)?;
        debug!(next_sequence, "Loaded insertion sequence");

        Ok(Self {
            db,
            next_sequence: Mutex::new(next_sequence),
        })
    }

    fn load_next_sequence(db: &DB) -> Result<u64, StorageError> {
        let cf = db
            .cf_handle(CF_INDEX_META)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_INDEX_META.to_string()))?;
        match db.get_cf(cf, META_NEXT_SEQUENCE)? {
            Some(bytes) => decode_sequence(&bytes),
            None => Ok(0),
        }
    }

    fn write_guard(&self) -> MutexGuard<'_, u64> {
        self.next_sequence.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Filesystem path of the database
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    // ==================== Hyperplane Methods ====================

    /// Load the persisted hyperplane family, if one exists.
    pub fn load_hyperplanes(&self) -> Result<Option<HyperplaneFamily>, StorageError> {
        let cf = self.cf(CF_INDEX_META)?;
        match self.db.get_cf(cf, META_HYPERPLANES)? {
            Some(bytes) => Ok(Some(HyperplaneFamily::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the hyperplane family unless one is already stored.
    ///
    /// Returns false (and writes nothing) when a family exists: the first
    /// family is authoritative for every signature in this database.
    pub fn persist_hyperplanes(&self, family: &HyperplaneFamily) -> Result<bool, StorageError> {
        let cf = self.cf(CF_INDEX_META)?;
        let _guard = self.write_guard();

        if self.db.get_cf(cf, META_HYPERPLANES)?.is_some() {
            warn!("Hyperplane family already persisted, keeping existing one");
            return Ok(false);
        }

        self.db.put_cf(cf, META_HYPERPLANES, family.to_bytes()?)?;
        info!(
            dim = family.dimension(),
            planes = family.len(),
            "Persisted hyperplane family"
        );
        Ok(true)
    }

    // ==================== Entry Methods ====================

    /// Store a new entry with its signature index row.
    ///
    /// Entry, index row and sequence counter are written in one batch.
    /// Fails with `DuplicateId` without writing if the id is taken.
    /// Returns the insertion sequence assigned to the entry.
    pub fn insert(&self, entry: &Entry) -> Result<u64, StorageError> {
        let entries_cf = self.cf(CF_ENTRIES)?;
        let signatures_cf = self.cf(CF_SIGNATURES)?;
        let meta_cf = self.cf(CF_INDEX_META)?;

        let mut next_sequence = self.write_guard();

        if self.db.get_pinned_cf(entries_cf, entry.id.as_bytes())?.is_some() {
            debug!(id = %entry.id, "Entry already exists");
            return Err(StorageError::DuplicateId(entry.id.clone()));
        }

        let sequence = *next_sequence;
        let record = StoredEntry::from_entry(entry, sequence).to_bytes()?;
        let index_key = SignatureKey::new(entry.signature, sequence);

        let mut batch = WriteBatch::default();
        batch.put_cf(entries_cf, entry.id.as_bytes(), record);
        batch.put_cf(signatures_cf, index_key.to_bytes(), entry.id.as_bytes());
        batch.put_cf(meta_cf, META_NEXT_SEQUENCE, encode_sequence(sequence + 1));
        self.db.write(batch)?;

        *next_sequence = sequence + 1;
        debug!(id = %entry.id, sequence, signature = %entry.signature, "Stored entry");
        Ok(sequence)
    }

    /// Get an entry by id
    pub fn get(&self, id: &str) -> Result<Option<Entry>, StorageError> {
        let cf = self.cf(CF_ENTRIES)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(StoredEntry::from_bytes(&bytes)?.into_entry(id))),
            None => Ok(None),
        }
    }

    /// Check whether an id is stored
    pub fn contains(&self, id: &str) -> Result<bool, StorageError> {
        let cf = self.cf(CF_ENTRIES)?;
        Ok(self.db.get_pinned_cf(cf, id.as_bytes())?.is_some())
    }

    /// Entries closest to `target` by Hamming distance, nearest first.
    ///
    /// Walks the signature index only, keeping the best `limit` keys in a
    /// bounded heap, then loads just those entries. Equal distances keep
    /// insertion order.
    pub fn scan_by_hamming_proximity(
        &self,
        target: Signature,
        limit: usize,
    ) -> Result<Vec<(Entry, u32)>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let signatures_cf = self.cf(CF_SIGNATURES)?;
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(limit + 1);
        let mut scanned = 0usize;

        for item in self.db.iterator_cf(signatures_cf, IteratorMode::Start) {
            let (key, id) = item?;
            let index_key = SignatureKey::from_bytes(&key)?;
            scanned += 1;

            let candidate = Candidate {
                distance: hamming(target, index_key.signature),
                sequence: index_key.sequence,
                id,
            };

            if heap.len() < limit {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let candidates = heap.into_sorted_vec();
        debug!(
            target = %target,
            scanned,
            candidates = candidates.len(),
            "Hamming scan complete"
        );

        let entries_cf = self.cf(CF_ENTRIES)?;
        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = std::str::from_utf8(&candidate.id)
                .map_err(|e| StorageError::Key(format!("Invalid UTF-8 id: {}", e)))?;
            let bytes = self.db.get_cf(entries_cf, &candidate.id)?.ok_or_else(|| {
                StorageError::Corrupt(format!("signature index points at missing entry {}", id))
            })?;
            let entry = StoredEntry::from_bytes(&bytes)?.into_entry(id);
            results.push((entry, candidate.distance));
        }

        Ok(results)
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<u64, StorageError> {
        self.count_cf_entries(self.cf(CF_SIGNATURES)?)
    }

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(cf)?;
            }
        }
        Ok(())
    }

    /// Flush and release the database.
    ///
    /// Dropping `Storage` also releases it; `close` surfaces flush errors.
    pub fn close(self) -> Result<(), StorageError> {
        let path = self.db.path().to_path_buf();
        let flushed = self.flush();
        drop(self);
        info!("Closed storage at {:?}", path);
        flushed
    }

    /// Get storage statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        Ok(StorageStats {
            entry_count: self.count()?,
            has_hyperplanes: self
                .db
                .get_pinned_cf(self.cf(CF_INDEX_META)?, META_HYPERPLANES)?
                .is_some(),
            next_sequence: *self.write_guard(),
            disk_usage_bytes: self.get_disk_usage(),
        })
    }

    fn count_cf_entries(&self, cf: &ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn get_disk_usage(&self) -> u64 {
        std::fs::read_dir(self.db.path())
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| entry.metadata().ok())
                    .map(|metadata| metadata.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// Statistics about the storage.
#[derive(Debug, Default)]
pub struct StorageStats {
    /// Number of entries stored
    pub entry_count: u64,
    /// Whether a hyperplane family has been persisted
    pub has_hyperplanes: bool,
    /// Sequence the next insert will receive
    pub next_sequence: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}
