//! Binary min-heap of tree fragments.
//!
//! Keys order by `(count, tag, index)`, so the extraction order is fully
//! determined by the input frequencies.

use crate::node::{Node, NodeId};

/// Ordering key of a fragment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FragmentKey {
    pub count: u64,
    pub tag: u64,
    pub id: NodeId,
}

impl FragmentKey {
    pub fn of(id: NodeId, node: &Node) -> Self {
        Self {
            count: node.count,
            tag: node.tag,
            id,
        }
    }
}

/// Array-backed binary min-heap.
///
/// # Invariants
/// - `keys[parent(i)] < keys[i]` for every `i > 0`
#[derive(Debug, Clone, Default)]
pub struct FragmentHeap {
    keys: Vec<FragmentKey>,
}

impl FragmentHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn peek(&self) -> Option<&FragmentKey> {
        self.keys.first()
    }

    pub fn push(&mut self, key: FragmentKey) {
        self.keys.push(key);
        self.sift_up(self.keys.len() - 1);
    }

    /// Remove and return the smallest key.
    pub fn pop(&mut self) -> Option<FragmentKey> {
        if self.keys.is_empty() {
            return None;
        }
        let last = self.keys.len() - 1;
        self.keys.swap(0, last);
        let min = self.keys.pop();
        if !self.keys.is_empty() {
            self.sift_down(0);
        }
        min
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.keys[i] >= self.keys[parent] {
                break;
            }
            self.keys.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.keys.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;

            if left < len && self.keys[left] < self.keys[smallest] {
                smallest = left;
            }
            if right < len && self.keys[right] < self.keys[smallest] {
                smallest = right;
            }
            if smallest == i {
                return;
            }
            self.keys.swap(i, smallest);
            i = smallest;
        }
    }
}

impl FromIterator<FragmentKey> for FragmentHeap {
    fn from_iter<I: IntoIterator<Item = FragmentKey>>(iter: I) -> Self {
        let mut heap = Self::default();
        for key in iter {
            heap.push(key);
        }
        heap
    }
}
