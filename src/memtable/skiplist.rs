//! Skip list memtable backing
//!
//! Nodes live in an arena and link to each other by index, so the structure
//! needs no unsafe code and no reference counting.
//!
//! ```text
//! Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
//! Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
//! Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
//! Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EntryIter, MemTableEntry, OrderedMap};

/// Maximum number of levels a node may have
pub const MAX_LEVEL: usize = 16;

/// Probability a node is promoted to the next level
pub const P: f64 = 0.5;

/// Arena index of the head sentinel
const HEAD: usize = 0;

struct Node {
    key: Vec<u8>,
    entry: MemTableEntry,
    /// Successor at each level this node participates in
    next: Vec<Option<usize>>,
}

/// Probabilistic sorted map with O(log n) expected insert and lookup
pub struct SkipList {
    /// nodes[0] is the head sentinel; its key is never compared
    nodes: Vec<Node>,
    /// Levels currently in use (at least 1)
    level: usize,
    len: usize,
    rng: StdRng,
}

impl SkipList {
    /// Create an empty skip list seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty skip list with a fixed seed (deterministic shape)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create an empty skip list drawing levels from `rng`
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            nodes: vec![Self::sentinel()],
            level: 1,
            len: 0,
            rng,
        }
    }

    /// Number of levels currently in use
    pub fn level(&self) -> usize {
        self.level
    }

    /// Height of every node, in key order
    pub fn node_heights(&self) -> Vec<usize> {
        let mut heights = Vec::with_capacity(self.len);
        let mut cur = self.nodes[HEAD].next[0];
        while let Some(idx) = cur {
            heights.push(self.nodes[idx].next.len());
            cur = self.nodes[idx].next[0];
        }
        heights
    }

    fn sentinel() -> Node {
        Node {
            key: Vec::new(),
            entry: MemTableEntry::Tombstone,
            next: vec![None; MAX_LEVEL],
        }
    }

    /// Last node with key < `key` on every level in use
    fn find_predecessors(&self, key: &[u8]) -> [usize; MAX_LEVEL] {
        let mut update = [HEAD; MAX_LEVEL];
        let mut cur = HEAD;
        for lvl in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].next[lvl] {
                if self.nodes[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[lvl] = cur;
        }
        update
    }

    /// Coin flips until the first failure, capped at MAX_LEVEL
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen_bool(P) {
            level += 1;
        }
        level
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedMap for SkipList {
    fn put(&mut self, key: Vec<u8>, entry: MemTableEntry) -> bool {
        let update = self.find_predecessors(&key);

        if let Some(next) = self.nodes[update[0]].next[0] {
            if self.nodes[next].key == key {
                self.nodes[next].entry = entry;
                return true;
            }
        }

        // The list grows by at most one level per insert; the head is
        // already the predecessor recorded for the new level.
        let mut level = self.random_level();
        if level > self.level {
            level = self.level + 1;
            self.level = level;
        }

        let idx = self.nodes.len();
        let next = (0..level)
            .map(|lvl| self.nodes[update[lvl]].next[lvl])
            .collect();
        self.nodes.push(Node { key, entry, next });
        for (lvl, &pred) in update.iter().enumerate().take(level) {
            self.nodes[pred].next[lvl] = Some(idx);
        }

        self.len += 1;
        false
    }

    fn get(&self, key: &[u8]) -> Option<&MemTableEntry> {
        let update = self.find_predecessors(key);
        let idx = self.nodes[update[0]].next[0]?;
        let node = &self.nodes[idx];
        (node.key.as_slice() == key).then_some(&node.entry)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::sentinel());
        self.level = 1;
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> EntryIter<'_> {
        Box::new(SkipListIter {
            list: self,
            cur: self.nodes[HEAD].next[0],
        })
    }
}

/// Follows level-0 links from the first real node
struct SkipListIter<'a> {
    list: &'a SkipList,
    cur: Option<usize>,
}

impl<'a> Iterator for SkipListIter<'a> {
    type Item = (&'a [u8], &'a MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.list;
        let node = &list.nodes[self.cur?];
        self.cur = node.next[0];
        Some((node.key.as_slice(), &node.entry))
    }
}
