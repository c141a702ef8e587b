//! Configuration for sparsekv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LsmError, Result};

/// Main configuration for a sparsekv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Store directory holding every file of the engine
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.dat              (write-ahead log)
    ///     ├── metadata.dat         (live run count + newest generation)
    ///     └── {N}_data.dat, {N}_index.dat, {N}_sparseindex.dat
    pub data_dir: PathBuf,

    /// Every k-th key of a sorted run is sampled into its sparse index
    pub sparse_key_distance: usize,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Truncate the WAL once a flush made the memtable durable
    pub truncate_wal_on_flush: bool,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Number of distinct keys in the memtable that triggers a flush
    pub memtable_threshold: usize,

    /// Ordered structure backing the memtable
    pub memtable_kind: MemTableKind,

    /// Fixed seed for skip list level selection (entropy when `None`)
    pub skiplist_seed: Option<u64>,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Live sorted runs allowed before the two oldest are merged
    pub merge_threshold: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Backing structure of the memtable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemTableKind {
    /// Probabilistic skip list, O(log n) expected
    #[default]
    SkipList,

    /// Unbalanced binary search tree
    BinaryTree,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./sparsekv_data"),
            sparse_key_distance: 16,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            truncate_wal_on_flush: true,
            memtable_threshold: 4,
            memtable_kind: MemTableKind::SkipList,
            skiplist_seed: None,
            merge_threshold: 2,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sparse_key_distance == 0 {
            return Err(LsmError::Config(
                "sparse_key_distance must be at least 1".to_string(),
            ));
        }
        if self.memtable_threshold == 0 {
            return Err(LsmError::Config(
                "memtable_threshold must be at least 1".to_string(),
            ));
        }
        if self.merge_threshold == 0 {
            return Err(LsmError::Config(
                "merge_threshold must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(LsmError::Config(
                "WAL sync interval must be at least 1 entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the sparse index sampling distance
    pub fn sparse_key_distance(mut self, distance: usize) -> Self {
        self.config.sparse_key_distance = distance;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Keep or drop WAL contents after a flush
    pub fn truncate_wal_on_flush(mut self, truncate: bool) -> Self {
        self.config.truncate_wal_on_flush = truncate;
        self
    }

    /// Set the memtable key count that triggers a flush
    pub fn memtable_threshold(mut self, keys: usize) -> Self {
        self.config.memtable_threshold = keys;
        self
    }

    /// Choose the memtable backing structure
    pub fn memtable_kind(mut self, kind: MemTableKind) -> Self {
        self.config.memtable_kind = kind;
        self
    }

    /// Fix the skip list random seed (deterministic level assignment)
    pub fn skiplist_seed(mut self, seed: u64) -> Self {
        self.config.skiplist_seed = Some(seed);
        self
    }

    /// Set the live run count above which the two oldest runs are merged
    pub fn merge_threshold(mut self, runs: usize) -> Self {
        self.config.merge_threshold = runs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
