//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - entries: id -> entry record (point reads, compressed)
//! - signatures: signature ++ sequence -> id (full scans of small keys)
//! - index_meta: hyperplane family and insertion sequence (tiny, hot)

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for entry records
pub const CF_ENTRIES: &str = "entries";

/// Column family name for the signature secondary index
pub const CF_SIGNATURES: &str = "signatures";

/// Column family name for index-level records
pub const CF_INDEX_META: &str = "index_meta";

/// Key of the singleton hyperplane family record in `index_meta`
pub const META_HYPERPLANES: &[u8] = b"hyperplanes";

/// Key of the next insertion sequence number in `index_meta`
pub const META_NEXT_SEQUENCE: &[u8] = b"next_sequence";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_ENTRIES, CF_SIGNATURES, CF_INDEX_META];

/// Entry records carry whole vectors, so compress them.
fn entries_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Signature keys are 16 fixed bytes and scanned end to end.
fn signatures_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ENTRIES, entries_options()),
        ColumnFamilyDescriptor::new(CF_SIGNATURES, signatures_options()),
        ColumnFamilyDescriptor::new(CF_INDEX_META, Options::default()),
    ]
}
