//! SSTable Module
//!
//! A sorted run: three immutable files sharing one ascending key order.
//!
//! ## File Format
//! ```text
//! {prefix}data.dat
//!   [KeyLen: u64][Key][ValLen: u64][Value]   ... one per key
//!   (ValLen = 0 means tombstone, no value bytes)
//!
//! {prefix}index.dat
//!   [KeyLen: u64][Key][8: u64][DataOffset: u64]   ... one per key
//!
//! {prefix}sparseindex.dat
//!   [KeyLen: u64][Key][8: u64][IndexOffset: u64]  ... keys 0, k, 2k, ...
//! ```
//! All integers are big-endian; every file uses the shared record codec.

mod builder;
mod iterator;
mod reader;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use builder::SSTableBuilder;
pub use iterator::DataFileIterator;
pub use reader::{SSTableReader, SearchRange};

use crate::error::Result;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Data file name after the generation prefix
pub const DATA_FILE_SUFFIX: &str = "data.dat";

/// Index file name after the generation prefix
pub const INDEX_FILE_SUFFIX: &str = "index.dat";

/// Sparse index file name after the generation prefix
pub const SPARSE_INDEX_FILE_SUFFIX: &str = "sparseindex.dat";

// =============================================================================
// File Triple
// =============================================================================

/// Paths of the three files making up one sorted run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub data: PathBuf,
    pub index: PathBuf,
    pub sparse_index: PathBuf,
}

impl TablePaths {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            data: dir.join(format!("{}{}", prefix, DATA_FILE_SUFFIX)),
            index: dir.join(format!("{}{}", prefix, INDEX_FILE_SUFFIX)),
            sparse_index: dir.join(format!("{}{}", prefix, SPARSE_INDEX_FILE_SUFFIX)),
        }
    }

    /// Data, index, sparse index, in that order
    pub fn all(&self) -> [&Path; 3] {
        [&self.data, &self.index, &self.sparse_index]
    }

    /// All three files are present
    pub fn exists(&self) -> bool {
        self.all().iter().all(|p| p.exists())
    }

    /// At least one of the three files is present
    pub fn any_exists(&self) -> bool {
        self.all().iter().any(|p| p.exists())
    }

    /// Delete whichever of the three files exist
    pub fn remove(&self) -> Result<()> {
        for path in self.all() {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Rename every file onto the matching file of `target`.
    ///
    /// Files already moved by an earlier, interrupted call are skipped.
    pub fn rename_to(&self, target: &TablePaths) -> Result<()> {
        for (from, to) in self.all().into_iter().zip(target.all()) {
            if from.exists() {
                fs::rename(from, to)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// SSTable Metadata
// =============================================================================

/// Summary of a finished sorted run, returned by the builder
#[derive(Debug, Clone)]
pub struct SSTable {
    /// Files of this run
    pub paths: TablePaths,
    /// Number of keys in this run
    pub entry_count: u64,
    /// Entries sampled into the sparse index
    pub sparse_entry_count: u64,
    /// Smallest key (empty for an empty run)
    pub min_key: Vec<u8>,
    /// Largest key (empty for an empty run)
    pub max_key: Vec<u8>,
    /// Data file size in bytes
    pub data_size: u64,
    /// Index file size in bytes
    pub index_size: u64,
}

impl SSTable {
    /// Get the number of entries
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false if key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.entry_count > 0 && key >= self.min_key.as_slice() && key <= self.max_key.as_slice()
    }
}
