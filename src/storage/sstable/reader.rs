//! SSTable Reader
//!
//! Point lookups through three narrowing stages, all exploiting the shared
//! key order of the three files:
//!
//! 1. Scan the sparse index for the bracket `[from, to)` of index offsets
//!    that could hold the key.
//! 2. Scan the index file inside that bracket for the exact key.
//! 3. Read the single record at the data offset found.
//!
//! Cost is O(sparse entries) + O(sparse key distance) records read.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::codec;
use crate::error::{LsmError, Result};
use crate::memtable::MemTableEntry;

use super::{DataFileIterator, TablePaths};

/// Bracket of index-file offsets that may contain a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    /// First index offset to scan (`None` = start of file)
    pub lower_bound: Option<u64>,
    /// Last index offset worth reading (`None` = extends to end of file)
    pub upper_bound: Option<u64>,
}

impl SearchRange {
    /// A bracket holding exactly one known index entry
    pub fn exact(offset: u64) -> Self {
        Self {
            lower_bound: Some(offset),
            upper_bound: Some(offset),
        }
    }
}

/// Reader for one sorted run
///
/// Opened per lookup; holds its three files only for the lifetime of the
/// reader.
pub struct SSTableReader {
    paths: TablePaths,
    data: BufReader<File>,
    index: BufReader<File>,
    sparse_index: BufReader<File>,
}

impl SSTableReader {
    /// Open the run stored under `{prefix}*.dat` in `dir`
    pub fn open(dir: &Path, prefix: &str) -> Result<Self> {
        let paths = TablePaths::new(dir, prefix);
        Ok(Self {
            data: BufReader::new(File::open(&paths.data)?),
            index: BufReader::new(File::open(&paths.index)?),
            sparse_index: BufReader::new(File::open(&paths.sparse_index)?),
            paths,
        })
    }

    /// Get an entry by key
    ///
    /// Returns:
    /// - `Ok(Some(Value(v)))`: key found with value
    /// - `Ok(Some(Tombstone))`: key found but deleted
    /// - `Ok(None)`: key not in this run
    pub fn get(&mut self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let Some(range) = self.search_sparse_index(key)? else {
            return Ok(None);
        };

        let Some(data_offset) = self.search_index(key, range)? else {
            return Ok(None);
        };

        self.read_data(key, data_offset)
    }

    /// Stage 1: find the index-file bracket for `key`.
    ///
    /// `None` means the key sorts before every sparse key (or the run is
    /// empty) and cannot be present.
    pub fn search_sparse_index(&mut self, key: &[u8]) -> Result<Option<SearchRange>> {
        self.sparse_index.seek(SeekFrom::Start(0))?;

        let mut lower_bound = None;
        while let Some(record) = codec::decode(&mut self.sparse_index)? {
            let offset = record.offset()?;
            match key.cmp(record.key.as_slice()) {
                Ordering::Less => {
                    return Ok(lower_bound.map(|_| SearchRange {
                        lower_bound,
                        upper_bound: Some(offset),
                    }));
                }
                Ordering::Equal => return Ok(Some(SearchRange::exact(offset))),
                Ordering::Greater => lower_bound = Some(offset),
            }
        }

        // Sparse index exhausted: the last bracket runs to end of file
        Ok(lower_bound.map(|_| SearchRange {
            lower_bound,
            upper_bound: None,
        }))
    }

    /// Stage 2: scan index entries inside `range` for `key`; returns the
    /// data-file offset on a match.
    pub fn search_index(&mut self, key: &[u8], range: SearchRange) -> Result<Option<u64>> {
        let mut position = range.lower_bound.unwrap_or(0);
        self.index.seek(SeekFrom::Start(position))?;

        loop {
            if matches!(range.upper_bound, Some(upper) if position > upper) {
                return Ok(None);
            }

            let Some(record) = codec::decode(&mut self.index)? else {
                return Ok(None);
            };

            match key.cmp(record.key.as_slice()) {
                Ordering::Equal => return record.offset().map(Some),
                // Keys ascend, so nothing further can match
                Ordering::Less => return Ok(None),
                Ordering::Greater => position += record.encoded_len(),
            }
        }
    }

    /// Stage 3: decode the record at `offset` and confirm its key.
    fn read_data(&mut self, key: &[u8], offset: u64) -> Result<Option<MemTableEntry>> {
        self.data.seek(SeekFrom::Start(offset))?;

        let record = codec::decode(&mut self.data)?.ok_or_else(|| {
            LsmError::Corruption(format!(
                "index of {} points past end of data file (offset {})",
                self.paths.data.display(),
                offset
            ))
        })?;

        if record.key != key {
            tracing::warn!(
                "Index/data mismatch in {} at offset {}",
                self.paths.data.display(),
                offset
            );
            return Ok(None);
        }

        Ok(Some(MemTableEntry::from_value(record.value)))
    }

    /// Sequential iterator over the data file (for compaction, debugging)
    pub fn iter(&self) -> Result<DataFileIterator> {
        DataFileIterator::open(&self.paths.data)
    }

    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }
}
