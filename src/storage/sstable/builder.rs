//! SSTable Builder
//!
//! Writes sorted entries to the data, index and sparse index files of a new
//! sorted run in a single pass.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use crate::codec;
use crate::error::{LsmError, Result};
use crate::memtable::MemTableEntry;

use super::{SSTable, TablePaths};

/// Builder for creating new sorted runs from ascending entries
pub struct SSTableBuilder {
    paths: TablePaths,
    data: BufWriter<File>,
    index: BufWriter<File>,
    sparse_index: BufWriter<File>,
    /// Every k-th key goes into the sparse index
    sparse_key_distance: u64,
    /// Number of entries written
    entry_count: u64,
    sparse_entry_count: u64,
    /// Running write position in the data file
    data_offset: u64,
    /// Running write position in the index file
    index_offset: u64,
    /// Track min/max keys for metadata and ordering checks
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
}

impl SSTableBuilder {
    /// Create the three files `{prefix}data.dat`, `{prefix}index.dat` and
    /// `{prefix}sparseindex.dat` under `dir`, truncating leftovers.
    ///
    /// Call `add()` in strictly ascending key order, then `finish()`.
    pub fn create(dir: &Path, prefix: &str, sparse_key_distance: usize) -> Result<Self> {
        if sparse_key_distance == 0 {
            return Err(LsmError::Config(
                "sparse_key_distance must be at least 1".to_string(),
            ));
        }

        let paths = TablePaths::new(dir, prefix);
        let data = BufWriter::new(Self::create_file(&paths.data)?);
        let index = BufWriter::new(Self::create_file(&paths.index)?);
        let sparse_index = BufWriter::new(Self::create_file(&paths.sparse_index)?);

        Ok(Self {
            paths,
            data,
            index,
            sparse_index,
            sparse_key_distance: sparse_key_distance as u64,
            entry_count: 0,
            sparse_entry_count: 0,
            data_offset: 0,
            index_offset: 0,
            min_key: None,
            max_key: None,
        })
    }

    fn create_file(path: &Path) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?)
    }

    /// Add a memtable entry (must be called in ascending key order)
    pub fn add(&mut self, key: &[u8], entry: &MemTableEntry) -> Result<()> {
        self.add_value(key, entry.as_value())
    }

    /// Add a raw record; `None` writes a tombstone
    pub fn add_value(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some(max) = &self.max_key {
            if key <= max.as_slice() {
                return Err(LsmError::Storage(format!(
                    "sorted run keys must be strictly ascending: {:?} after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(max)
                )));
            }
        }

        // Step 1: full record into the data file
        let data_bytes = codec::encode(&mut self.data, key, value)?;

        // Step 2: key → data offset into the index file
        let index_bytes = codec::encode_offset(&mut self.index, key, self.data_offset)?;

        // Step 3: every k-th key → index offset into the sparse index
        if self.entry_count % self.sparse_key_distance == 0 {
            codec::encode_offset(&mut self.sparse_index, key, self.index_offset)?;
            self.sparse_entry_count += 1;
        }

        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        self.max_key = Some(key.to_vec());

        self.entry_count += 1;
        self.data_offset += data_bytes;
        self.index_offset += index_bytes;
        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Flush, fsync and close all three files and return the run summary.
    ///
    /// The run must not be read before this returns.
    pub fn finish(self) -> Result<SSTable> {
        for writer in [self.data, self.index, self.sparse_index] {
            let file = writer.into_inner().map_err(|e| LsmError::Io(e.into_error()))?;
            file.sync_all()?;
        }

        Ok(SSTable {
            paths: self.paths,
            entry_count: self.entry_count,
            sparse_entry_count: self.sparse_entry_count,
            min_key: self.min_key.unwrap_or_default(),
            max_key: self.max_key.unwrap_or_default(),
            data_size: self.data_offset,
            index_size: self.index_offset,
        })
    }
}
