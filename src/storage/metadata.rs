//! Generation Metadata
//!
//! Which sorted runs are live. Rewritten whole on every flush and merge.
//!
//! ## File Format (16 bytes)
//! ```text
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ LiveRuns: i64 (BE, 8)    │ NewestGeneration: i64 (BE, 8) │
//! └──────────────────────────┴──────────────────────────────┘
//! ```

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{LsmError, Result};

/// Metadata file name inside the store directory
pub const METADATA_FILENAME: &str = "metadata.dat";

/// Encoded size of the metadata record
pub const METADATA_SIZE: usize = 16;

/// Live run count and newest generation id
///
/// Live generations are the contiguous range
/// `newest_generation - live_runs + 1 ..= newest_generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub live_runs: i64,
    pub newest_generation: i64,
}

impl Default for Metadata {
    /// An empty store: no runs, next flush writes generation 0
    fn default() -> Self {
        Self {
            live_runs: 0,
            newest_generation: -1,
        }
    }
}

/// Fixed-width big-endian encoding
fn encoding() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
}

impl Metadata {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(METADATA_FILENAME)
    }

    fn temp_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.tmp", METADATA_FILENAME))
    }

    /// Read the metadata of the store in `dir`; absent file = empty store
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() < METADATA_SIZE {
            return Err(LsmError::Corruption(format!(
                "{} holds {} bytes, expected {}",
                path.display(),
                bytes.len(),
                METADATA_SIZE
            )));
        }

        let metadata: Metadata = encoding().deserialize(&bytes[..METADATA_SIZE])?;
        if metadata.live_runs < 0 || metadata.live_runs > metadata.newest_generation + 1 {
            return Err(LsmError::Corruption(format!(
                "inconsistent metadata: {} live runs with newest generation {}",
                metadata.live_runs, metadata.newest_generation
            )));
        }
        Ok(metadata)
    }

    /// Replace the metadata file with this record.
    ///
    /// Written to a temporary file, synced, then renamed into place.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let bytes = encoding().serialize(self)?;
        let temp = Self::temp_path(dir);

        let mut file = File::create(&temp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, Self::path(dir))?;
        Ok(())
    }

    /// Remove a temporary file left by an interrupted `persist`
    pub fn remove_stale_temp(dir: &Path) -> Result<bool> {
        match fs::remove_file(Self::temp_path(dir)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Oldest live generation id (meaningless when `live_runs == 0`)
    pub fn oldest_generation(&self) -> i64 {
        self.newest_generation - self.live_runs + 1
    }

    /// Live generation ids, newest first
    pub fn live_generations(&self) -> impl Iterator<Item = i64> {
        (self.oldest_generation()..=self.newest_generation).rev()
    }

    pub fn is_live(&self, generation: i64) -> bool {
        self.live_runs > 0
            && generation >= self.oldest_generation()
            && generation <= self.newest_generation
    }

    /// State after flushing one new run
    pub fn after_flush(&self) -> Self {
        Self {
            live_runs: self.live_runs + 1,
            newest_generation: self.newest_generation + 1,
        }
    }

    /// State after merging the two oldest runs into one
    pub fn after_merge(&self) -> Self {
        Self {
            live_runs: self.live_runs - 1,
            newest_generation: self.newest_generation,
        }
    }
}
