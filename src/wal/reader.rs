//! WAL Reader
//!
//! Reads records back from the WAL file for startup replay.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::codec::{self, Record};
use crate::error::Result;
use crate::memtable::{MemTable, MemTableEntry};

/// Reads records from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    records_read: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            records_read: 0,
        })
    }

    /// Read the next record; `None` at a clean end of log
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let record = codec::decode(&mut self.reader)?;
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    /// Iterate over all records; stops after the first error
    pub fn records(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Replay every record of the log at `path` into `memtable`.
    ///
    /// A missing file replays nothing. A record cut short is fatal: the
    /// error is returned and the memtable must be discarded.
    pub fn replay(path: &Path, memtable: &mut MemTable) -> Result<u64> {
        if !path.exists() {
            return Ok(0);
        }

        let mut reader = Self::open(path)?;
        while let Some(record) = reader.next_record()? {
            memtable.insert(record.key, MemTableEntry::from_value(record.value));
        }

        tracing::debug!(
            "Replayed {} WAL records from {}",
            reader.records_read,
            path.display()
        );
        Ok(reader.records_read)
    }
}

/// Iterator over WAL records
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
