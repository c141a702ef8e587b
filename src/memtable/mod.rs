//! MemTable Module
//!
//! In-memory ordered index for recent writes.
//!
//! ## Responsibilities
//! - Fast point reads and upserts in memory
//! - Ascending iteration for sorted run creation
//! - Track distinct key count for flush triggers
//!
//! ## Data Structure Choice
//! The memtable depends only on the [`OrderedMap`] contract. Two backings
//! implement it and can be swapped through `Config::memtable_kind`:
//! - [`SkipList`]: probabilistic, O(log n) expected (default)
//! - [`BinaryTree`]: unbalanced BST, O(log n) on random input

mod skiplist;
mod table;
mod tree;

pub use skiplist::{SkipList, MAX_LEVEL, P};
pub use table::MemTable;
pub use tree::BinaryTree;

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    /// Build an entry from its on-disk form (`None` = tombstone)
    pub fn from_value(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(v) => MemTableEntry::Value(v),
            None => MemTableEntry::Tombstone,
        }
    }

    /// Build an entry from value bytes; empty bytes are a tombstone, matching
    /// the on-disk encoding
    pub fn from_slice(value: &[u8]) -> Self {
        if value.is_empty() {
            MemTableEntry::Tombstone
        } else {
            MemTableEntry::Value(value.to_vec())
        }
    }

    /// Value bytes as written to disk (`None` = tombstone)
    pub fn as_value(&self) -> Option<&[u8]> {
        match self {
            MemTableEntry::Value(v) => Some(v),
            MemTableEntry::Tombstone => None,
        }
    }

    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            MemTableEntry::Value(v) => Some(v),
            MemTableEntry::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, MemTableEntry::Tombstone)
    }
}

/// Ascending iterator borrowed from an ordered map
pub type EntryIter<'a> = Box<dyn Iterator<Item = (&'a [u8], &'a MemTableEntry)> + 'a>;

/// Sorted map over byte-string keys
///
/// Implementations keep keys unique and iterate them in byte-lexicographic
/// order. Iterators are restartable but must not outlive a mutation.
pub trait OrderedMap: Send + Sync {
    /// Insert or overwrite; returns true if the key already existed
    fn put(&mut self, key: Vec<u8>, entry: MemTableEntry) -> bool;

    /// Point lookup; a tombstone is `Some(&Tombstone)`, not `None`
    fn get(&self, key: &[u8]) -> Option<&MemTableEntry>;

    /// Drop every entry
    fn clear(&mut self);

    /// Number of distinct keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh ascending cursor from the smallest key
    fn iter(&self) -> EntryIter<'_>;
}
