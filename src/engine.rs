//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Replay the WAL on startup
//! - Flush the memtable and merge runs when the policy says so
//! - Serve reads from the memtable first, then runs newest → oldest

use std::fs;
use std::path::Path;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{LsmError, Result};
use crate::memtable::{MemTable, MemTableEntry};
use crate::policy::{CompactionPolicy, ThresholdPolicy};
use crate::storage::{Metadata, StorageManager};
use crate::wal::{WalReader, WalWriter};

/// Everything a write touches, guarded together
struct EngineState {
    /// Write-ahead log for durability
    wal: WalWriter,

    /// In-memory table for recent writes
    memtable: MemTable,

    /// Sorted runs and generation metadata
    storage: StorageManager,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/flush/compact): take the write lock
///   - WAL append → memtable → flush → merge, all on the calling thread
///
/// - **Reads** (get/lookup): take the read lock
///   - Many readers at once; a reader never observes a half-done flush
///     or merge because those hold the write lock
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// When to flush and merge
    policy: Box<dyn CompactionPolicy>,

    state: RwLock<EngineState>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.dat";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config and create the data directory
    /// 2. Load metadata and repair interrupted merges
    /// 3. Replay the WAL into a fresh memtable
    /// 4. Ready to serve requests
    ///
    /// Any failure is reported as `LsmError::Construction`.
    pub fn open(config: Config) -> Result<Self> {
        let policy = ThresholdPolicy::from_config(&config);
        Self::open_with_policy(config, policy)
    }

    /// Open with a custom flush/merge policy
    pub fn open_with_policy(
        config: Config,
        policy: impl CompactionPolicy + 'static,
    ) -> Result<Self> {
        // Step 1: Reject unusable settings
        config
            .validate()
            .map_err(|e| LsmError::construction("invalid configuration", e))?;

        // Step 2: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            LsmError::construction(
                format!("cannot create {}", config.data_dir.display()),
                e.into(),
            )
        })?;

        // Step 3: Open storage (loads metadata, repairs merges)
        let storage = StorageManager::open(&config.data_dir, config.sparse_key_distance)
            .map_err(|e| LsmError::construction("cannot load sorted runs", e))?;

        // Step 4: Replay WAL into a fresh memtable
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let mut memtable = MemTable::with_kind(config.memtable_kind, config.skiplist_seed);
        let replayed = WalReader::replay(&wal_path, &mut memtable)
            .map_err(|e| LsmError::construction("cannot replay write-ahead log", e))?;

        // Step 5: Open WAL for appending
        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)
            .map_err(|e| LsmError::construction("cannot open write-ahead log", e))?;

        tracing::info!(
            "Engine opened at {}: {} WAL records replayed, {} keys in memtable",
            config.data_dir.display(),
            replayed,
            memtable.entry_count()
        );

        Ok(Self {
            config,
            policy: Box::new(policy),
            state: RwLock::new(EngineState {
                wal,
                memtable,
                storage,
            }),
        })
    }

    /// Open with a path and sparse key distance (convenience method)
    ///
    /// Uses default config for everything else
    pub fn open_path(path: &Path, sparse_key_distance: usize) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .sparse_key_distance(sparse_key_distance)
            .build();
        Self::open(config)
    }

    /// Get a value by key
    ///
    /// Returns `None` both for keys never written and for deleted keys.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.lookup(key)?.and_then(MemTableEntry::into_value))
    }

    /// Look up a key, distinguishing deleted keys from absent ones
    ///
    /// Search order:
    /// 1. MemTable (most recent writes, tombstones included)
    /// 2. Sorted runs (newest to oldest)
    pub fn lookup(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let state = self.state.read();

        if let Some(entry) = state.memtable.get(key) {
            return Ok(Some(entry.clone()));
        }

        state.storage.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Write to WAL (synced before the memtable changes)
    /// 2. Write to MemTable
    /// 3. Flush and merge if the policy asks for it
    ///
    /// An empty value is stored as a tombstone, the same thing it decodes to
    /// once written to the WAL or a sorted run.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(key, MemTableEntry::from_slice(value))
    }

    /// Delete a key by writing a tombstone
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.write(key, MemTableEntry::Tombstone)
    }

    fn write(&self, key: &[u8], entry: MemTableEntry) -> Result<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        // Step 1: Write to WAL first (durability guarantee)
        state.wal.append(key, &entry)?;

        // Step 2: Write to MemTable
        state.memtable.insert(key.to_vec(), entry);

        // Step 3: Flush / merge
        if self.policy.should_flush(state.memtable.entry_count()) {
            self.flush_internal(state)?;
        }
        while self.policy.should_merge(state.storage.live_runs()) {
            state.storage.merge_oldest()?;
        }

        Ok(())
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size; no-op when empty
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.state.write();
        self.flush_internal(&mut guard)
    }

    /// Merge the two oldest runs now; returns false if fewer than two exist
    pub fn compact(&self) -> Result<bool> {
        let mut guard = self.state.write();
        if guard.storage.live_runs() < 2 {
            return Ok(false);
        }
        guard.storage.merge_oldest()?;
        Ok(true)
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self, state: &mut EngineState) -> Result<()> {
        // Skip if memtable is empty
        if state.memtable.is_empty() {
            return Ok(());
        }

        // Step 1: Write the new run and make it live
        state.storage.flush(&state.memtable)?;

        // Step 2: Clear memtable
        state.memtable.clear();

        // Step 3: Truncate WAL (entries are now durable in a run)
        if self.config.truncate_wal_on_flush {
            state.wal.truncate()?;
        }

        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        let mut state = self.state.write();
        state.wal.sync()?;
        tracing::info!("Engine closed at {}", self.config.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.state.read().memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.state.read().memtable.entry_count()
    }

    /// Get the number of live sorted runs
    pub fn live_runs(&self) -> usize {
        self.state.read().storage.live_runs()
    }

    /// Id of the newest sorted run (-1 for an empty store)
    pub fn newest_generation(&self) -> i64 {
        self.state.read().storage.newest_generation()
    }

    /// Snapshot of the generation metadata
    pub fn metadata(&self) -> Metadata {
        self.state.read().storage.metadata()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
