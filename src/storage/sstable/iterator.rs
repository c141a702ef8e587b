//! SSTable Iterator
//!
//! Sequential iteration over the data file of a sorted run, with a
//! one-record look-ahead so a merge can compare heads without consuming.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::codec::{self, Record};
use crate::error::Result;

/// Iterator over a data file in sorted key order
pub struct DataFileIterator {
    reader: BufReader<File>,
    /// Next record to hand out (`None` once the file is exhausted)
    current: Option<Record>,
}

impl DataFileIterator {
    /// Open a data file and buffer its first record
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let current = codec::decode(&mut reader)?;
        Ok(Self { reader, current })
    }

    /// The buffered record, without consuming it
    pub fn current(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    /// Take the buffered record and read the one after it
    pub fn advance(&mut self) -> Result<Option<Record>> {
        let taken = self.current.take();
        if taken.is_some() {
            self.current = codec::decode(&mut self.reader)?;
        }
        Ok(taken)
    }

    /// Whether a buffered record remains
    pub fn has_next(&self) -> bool {
        self.current.is_some()
    }
}

impl Iterator for DataFileIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                // A decode error is not resumable
                self.current = None;
                Some(Err(e))
            }
        }
    }
}
