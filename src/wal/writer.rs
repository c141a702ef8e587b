//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::config::WalSyncStrategy;
use crate::error::Result;
use crate::memtable::MemTableEntry;

/// Appends records to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    sync_strategy: WalSyncStrategy,
    /// Records appended through this handle
    entries_written: u64,
    /// Records appended since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file; new records go to the end
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy,
            entries_written: 0,
            unsynced: 0,
        })
    }

    /// Append one record; returns the number of bytes written.
    ///
    /// With `EveryWrite` the record is on disk when this returns.
    pub fn append(&mut self, key: &[u8], entry: &MemTableEntry) -> Result<u64> {
        let written = codec::encode(&mut self.file, key, entry.as_value())?;
        self.entries_written += 1;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(written)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop all records (their contents are durable elsewhere)
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.unsynced = 0;
        tracing::debug!("Truncated WAL {}", self.path.display());
        Ok(())
    }

    /// Records appended through this handle since open
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
