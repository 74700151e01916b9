//! Tree node model.
//!
//! Nodes live in an arena owned by [`Tree`](crate::tree::Tree) and refer to
//! each other by [`NodeId`]. A node with no children is a leaf; an internal
//! node always has both.
//!
//! # Ordering
//!
//! Fragments are ordered by `(count, tag)`. A leaf's tag is its symbol; an
//! internal node's tag is `left.tag + right.tag + 256`, which keeps internal
//! tags disjoint from leaf tags. The arena index breaks any remaining tie so
//! that two distinct nodes never compare equal.

use std::cell::OnceCell;

use bitvec::prelude::*;
use log::warn;

/// Offset added to every internal node's tag.
pub const INTERNAL_TAG_OFFSET: u64 = 256;

/// Number of count bits a serialized record can hold.
pub const COUNT_BITS: u32 = 55;

/// Largest count representable in a record.
pub const MAX_RECORD_COUNT: u64 = (1 << COUNT_BITS) - 1;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A leaf or internal node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Weight: occurrences of the symbol, or the sum of the children's weights
    pub(crate) count: u64,
    /// Tie-break key
    pub(crate) tag: u64,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// Non-owning back-reference, used only for path derivation
    pub(crate) parent: Option<NodeId>,
    /// Bits from the root to this node (0 = left, 1 = right)
    pub(crate) path: BitVec<u8, Lsb0>,
    /// Serialized record, computed on first use
    record: OnceCell<[u8; 8]>,
}

impl Node {
    pub(crate) fn leaf(symbol: u8, count: u64) -> Self {
        Self {
            count,
            tag: u64::from(symbol),
            left: None,
            right: None,
            parent: None,
            path: BitVec::new(),
            record: OnceCell::new(),
        }
    }

    /// Internal node over two fragments; `count` and `tag` come from the children.
    pub(crate) fn internal(left: (NodeId, &Node), right: (NodeId, &Node)) -> Self {
        Self::internal_with_count(left, right, left.1.count.wrapping_add(right.1.count))
    }

    pub(crate) fn internal_with_count(
        left: (NodeId, &Node),
        right: (NodeId, &Node),
        count: u64,
    ) -> Self {
        Self {
            count,
            tag: left.1.tag + right.1.tag + INTERNAL_TAG_OFFSET,
            left: Some(left.0),
            right: Some(right.0),
            parent: None,
            path: BitVec::new(),
            record: OnceCell::new(),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Symbol carried by a leaf; `None` for internal nodes.
    pub fn symbol(&self) -> Option<u8> {
        if self.is_leaf() {
            u8::try_from(self.tag).ok()
        } else {
            None
        }
    }

    pub fn path(&self) -> &BitSlice<u8, Lsb0> {
        &self.path
    }

    pub fn path_length(&self) -> usize {
        self.path.len()
    }

    /// The node's 8-byte record.
    ///
    /// Bit 0 is the leaf flag, bits 1..=55 the low 55 bits of the count, and
    /// bits 56..=63 the symbol (zero for internal nodes). The record is the
    /// little-endian encoding of that 64-bit word.
    pub fn record_bytes(&self) -> [u8; 8] {
        *self.record.get_or_init(|| {
            if self.count > MAX_RECORD_COUNT {
                warn!(
                    "count {} exceeds {} bits, truncating in record",
                    self.count, COUNT_BITS
                );
            }
            let mut word = (self.count & MAX_RECORD_COUNT) << 1;
            if let Some(symbol) = self.symbol() {
                word |= 1;
                word |= u64::from(symbol) << 56;
            }
            word.to_le_bytes()
        })
    }
}

/// A decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub is_leaf: bool,
    pub count: u64,
    pub symbol: u8,
}

impl Record {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let word = u64::from_le_bytes(bytes);
        Self {
            is_leaf: word & 1 == 1,
            count: (word >> 1) & MAX_RECORD_COUNT,
            symbol: (word >> 56) as u8,
        }
    }
}
