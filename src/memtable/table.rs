//! MemTable implementation
//!
//! Wraps an [`OrderedMap`] backing and keeps the bookkeeping the engine
//! needs to decide when to flush.

use crate::config::MemTableKind;

use super::{BinaryTree, EntryIter, MemTableEntry, OrderedMap, SkipList};

/// In-memory table for recent writes
pub struct MemTable {
    /// Ordered backing structure
    map: Box<dyn OrderedMap>,
    /// Distinct keys inserted since the last clear
    entry_count: usize,
    /// Approximate size in bytes (keys + live values)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable backed by a skip list
    pub fn new() -> Self {
        Self::with_map(Box::new(SkipList::new()))
    }

    /// Create a MemTable of the configured kind
    pub fn with_kind(kind: MemTableKind, seed: Option<u64>) -> Self {
        let map: Box<dyn OrderedMap> = match kind {
            MemTableKind::SkipList => match seed {
                Some(seed) => Box::new(SkipList::with_seed(seed)),
                None => Box::new(SkipList::new()),
            },
            MemTableKind::BinaryTree => Box::new(BinaryTree::new()),
        };
        Self::with_map(map)
    }

    /// Create a MemTable over any ordered map
    pub fn with_map(map: Box<dyn OrderedMap>) -> Self {
        Self {
            map,
            entry_count: 0,
            size: 0,
        }
    }

    /// Get an entry by key; a tombstone is returned as `Some(Tombstone)`
    pub fn get(&self, key: &[u8]) -> Option<&MemTableEntry> {
        self.map.get(key)
    }

    /// Put a key-value pair; returns true if the key already existed.
    ///
    /// An empty value is stored as a tombstone.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> bool {
        let value = (!value.is_empty()).then_some(value);
        self.insert(key, MemTableEntry::from_value(value))
    }

    /// Delete a key by inserting a tombstone
    pub fn delete(&mut self, key: Vec<u8>) -> bool {
        self.insert(key, MemTableEntry::Tombstone)
    }

    /// Insert any entry (used by WAL replay)
    pub fn insert(&mut self, key: Vec<u8>, entry: MemTableEntry) -> bool {
        let added = key.len() + entry.as_value().map_or(0, <[u8]>::len);
        let existed = self.map.put(key, entry);
        if !existed {
            self.entry_count += 1;
        }
        self.size += added;
        existed
    }

    /// Get approximate size in bytes (overwrites are counted again)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get distinct key count
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Iterate all entries in ascending key order
    pub fn iter(&self) -> EntryIter<'_> {
        self.map.iter()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&mut self) {
        self.map.clear();
        self.entry_count = 0;
        self.size = 0;
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
