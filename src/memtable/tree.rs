//! Binary search tree memtable backing
//!
//! Unbalanced; fine for the shuffled keys a memtable usually sees, but
//! degrades to a list on sorted input. Kept as an interchangeable
//! alternative to the skip list.

use std::cmp::Ordering;

use super::{EntryIter, MemTableEntry, OrderedMap};

struct TreeNode {
    key: Vec<u8>,
    entry: MemTableEntry,
    left: Option<usize>,
    right: Option<usize>,
}

/// Arena-backed binary search tree
#[derive(Default)]
pub struct BinaryTree {
    nodes: Vec<TreeNode>,
    root: Option<usize>,
}

impl BinaryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, key: &[u8]) -> Option<usize> {
        let mut cur = self.root;
        while let Some(idx) = cur {
            let node = &self.nodes[idx];
            cur = match key.cmp(node.key.as_slice()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(idx),
            };
        }
        None
    }
}

impl OrderedMap for BinaryTree {
    fn put(&mut self, key: Vec<u8>, entry: MemTableEntry) -> bool {
        let new_idx = self.nodes.len();
        let Some(mut cur) = self.root else {
            self.nodes.push(TreeNode {
                key,
                entry,
                left: None,
                right: None,
            });
            self.root = Some(new_idx);
            return false;
        };

        loop {
            let node = &mut self.nodes[cur];
            let slot = match key.cmp(&node.key) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => {
                    node.entry = entry;
                    return true;
                }
            };
            match *slot {
                Some(child) => cur = child,
                None => {
                    *slot = Some(new_idx);
                    break;
                }
            }
        }

        self.nodes.push(TreeNode {
            key,
            entry,
            left: None,
            right: None,
        });
        false
    }

    fn get(&self, key: &[u8]) -> Option<&MemTableEntry> {
        self.find(key).map(|idx| &self.nodes[idx].entry)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn iter(&self) -> EntryIter<'_> {
        let mut iter = TreeIter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        Box::new(iter)
    }
}

/// In-order traversal with an explicit stack
struct TreeIter<'a> {
    tree: &'a BinaryTree,
    stack: Vec<usize>,
}

impl TreeIter<'_> {
    fn push_left(&mut self, mut cur: Option<usize>) {
        while let Some(idx) = cur {
            self.stack.push(idx);
            cur = self.tree.nodes[idx].left;
        }
    }
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = (&'a [u8], &'a MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[idx];
        self.push_left(node.right);
        Some((node.key.as_slice(), &node.entry))
    }
}
