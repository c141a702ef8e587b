//! Storage Manager
//!
//! Owns the generation metadata and coordinates sorted-run reads and writes.
//!
//! ## Responsibilities
//! - Load metadata and repair interrupted merges on startup
//! - Search live runs newest → oldest for reads
//! - Create new runs from memtable flushes
//! - Merge the two oldest runs when asked

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LsmError, Result};
use crate::memtable::{MemTable, MemTableEntry};

use super::merge::merge_generations;
use super::metadata::Metadata;
use super::sstable::{SSTable, SSTableBuilder, SSTableReader, TablePaths};
use super::{generation_prefix, merge_prefix, MERGE_PREFIX};

/// Manages the sorted runs of one store directory
///
/// Runs are referenced by generation id only; files are opened per
/// operation and closed before it returns.
pub struct StorageManager {
    /// Store directory
    data_dir: PathBuf,

    /// Sampling distance for new runs
    sparse_key_distance: usize,

    /// Live run count and newest generation id
    metadata: Metadata,
}

impl StorageManager {
    /// Open storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Load metadata (absent = empty store)
    /// 3. Finish or roll back any interrupted merge
    /// 4. Verify every live run is present
    pub fn open(path: &Path, sparse_key_distance: usize) -> Result<Self> {
        fs::create_dir_all(path)?;

        let metadata = Metadata::load(path)?;
        let mut manager = Self {
            data_dir: path.to_path_buf(),
            sparse_key_distance,
            metadata,
        };

        manager.recover()?;

        tracing::info!(
            "Opened storage at {}: {} live runs, newest generation {}",
            path.display(),
            manager.metadata.live_runs,
            manager.metadata.newest_generation
        );
        Ok(manager)
    }

    /// Get an entry by key (searches live runs newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: first run holding the key (may be a tombstone)
    /// - `Ok(None)`: no live run holds the key
    pub fn get(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        for generation in self.metadata.live_generations() {
            let mut reader = SSTableReader::open(&self.data_dir, &generation_prefix(generation))?;
            if let Some(entry) = reader.get(key)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Flush a MemTable to a new run at generation `newest + 1`
    ///
    /// The run is written and synced before the metadata makes it live.
    pub fn flush(&mut self, memtable: &MemTable) -> Result<SSTable> {
        let next = self.metadata.after_flush();
        let prefix = generation_prefix(next.newest_generation);

        let mut builder = SSTableBuilder::create(&self.data_dir, &prefix, self.sparse_key_distance)?;
        for (key, entry) in memtable.iter() {
            builder.add(key, entry)?;
        }
        let table = builder.finish()?;

        next.persist(&self.data_dir)?;
        self.metadata = next;

        tracing::debug!(
            "Flushed {} entries to generation {} ({} sparse samples)",
            table.entry_count,
            next.newest_generation,
            table.sparse_entry_count
        );
        Ok(table)
    }

    /// Merge the two oldest live runs into one that keeps the newer id
    pub fn merge_oldest(&mut self) -> Result<SSTable> {
        if self.metadata.live_runs < 2 {
            return Err(LsmError::Storage(format!(
                "merge needs two live runs, have {}",
                self.metadata.live_runs
            )));
        }

        let older = self.metadata.oldest_generation();
        let newer = older + 1;
        let table = merge_generations(&self.data_dir, older, newer, self.sparse_key_distance)?;

        let next = self.metadata.after_merge();
        next.persist(&self.data_dir)?;
        self.metadata = next;

        Ok(table)
    }

    /// Get the number of live runs
    pub fn live_runs(&self) -> usize {
        self.metadata.live_runs as usize
    }

    /// Id of the newest run (-1 for an empty store)
    pub fn newest_generation(&self) -> i64 {
        self.metadata.newest_generation
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Startup Recovery
    // =========================================================================

    /// Reconcile files on disk with the metadata after a crash.
    fn recover(&mut self) -> Result<()> {
        if Metadata::remove_stale_temp(&self.data_dir)? {
            tracing::warn!("Removed stale metadata temp file");
        }

        let listing = self.scan_dir()?;

        for &generation in &listing.merges {
            self.recover_merge(generation)?;
        }

        // Crash after the merge rename but before the metadata write: the
        // older source is gone and the merged run already holds its keys.
        if self.metadata.live_runs > 1 {
            let oldest = self.metadata.oldest_generation();
            let oldest_paths = self.generation_paths(oldest);
            if !oldest_paths.any_exists() && self.generation_paths(oldest + 1).exists() {
                tracing::warn!("Generation {} was merged away; updating metadata", oldest);
                let next = self.metadata.after_merge();
                next.persist(&self.data_dir)?;
                self.metadata = next;
            }
        }

        for generation in self.metadata.live_generations() {
            if !self.generation_paths(generation).exists() {
                return Err(LsmError::Corruption(format!(
                    "live generation {} is missing files in {}",
                    generation,
                    self.data_dir.display()
                )));
            }
        }

        // Runs written by a flush whose metadata never landed, or sources of
        // a finished merge: not live, and never read.
        for &generation in &listing.generations {
            if !self.metadata.is_live(generation) {
                tracing::warn!("Removing orphaned generation {}", generation);
                self.generation_paths(generation).remove()?;
            }
        }

        Ok(())
    }

    /// Finish or roll back a merge that wrote into `generation`.
    ///
    /// Sources are only deleted once the merge output is synced, so a
    /// missing source means the output is complete.
    fn recover_merge(&mut self, generation: i64) -> Result<()> {
        let output = TablePaths::new(&self.data_dir, &merge_prefix(generation));
        let newer = self.generation_paths(generation);
        let older = self.generation_paths(generation - 1);

        if newer.exists() && older.exists() {
            tracing::warn!("Discarding incomplete merge into generation {}", generation);
            return output.remove();
        }

        tracing::warn!("Completing interrupted merge into generation {}", generation);
        older.remove()?;
        // A file of `newer` is stale only while its merge replacement exists
        for (merged, target) in output.all().into_iter().zip(newer.all()) {
            if merged.exists() {
                match fs::remove_file(target) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        output.rename_to(&newer)
    }

    fn generation_paths(&self, generation: i64) -> TablePaths {
        TablePaths::new(&self.data_dir, &generation_prefix(generation))
    }

    /// Collect generation ids of run files and merge outputs on disk
    fn scan_dir(&self) -> Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if let Some(rest) = name.strip_prefix(MERGE_PREFIX) {
                if let Some(id) = parse_generation(rest) {
                    listing.merges.insert(id);
                }
            } else if let Some(id) = parse_generation(&name) {
                listing.generations.insert(id);
            }
        }

        Ok(listing)
    }
}

/// Run files found on disk
#[derive(Debug, Default)]
struct DirListing {
    generations: BTreeSet<i64>,
    merges: BTreeSet<i64>,
}

/// "12_data.dat" → Some(12); anything that is not a run file → None
fn parse_generation(name: &str) -> Option<i64> {
    let (id, suffix) = name.split_once('_')?;
    let is_run_file = [
        super::DATA_FILE_SUFFIX,
        super::INDEX_FILE_SUFFIX,
        super::SPARSE_INDEX_FILE_SUFFIX,
    ]
    .contains(&suffix);
    if !is_run_file {
        return None;
    }
    id.parse().ok()
}
