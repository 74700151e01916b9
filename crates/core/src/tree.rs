//! Huffman tree construction and path generation.
//!
//! # Construction
//!
//! One leaf is created per present symbol. Fragments are merged pairwise,
//! smallest first, from a [`FragmentHeap`]: the smallest fragment becomes the
//! left child and the next smallest the right child. Construction is
//! O(L log L) in the number of distinct symbols L.
//!
//! # Paths
//!
//! After construction the tree is walked top-down. Entering a left child
//! appends a 0 bit, entering a right child appends a 1 bit. A tree with a
//! single leaf gives that leaf an empty path: no bits are needed per
//! occurrence.
//!
//! # Example
//! ```
//! use huffpack_core::frequency::FrequencyTable;
//! use huffpack_core::tree::Tree;
//!
//! let tree = Tree::from_frequencies(&FrequencyTable::from_bytes(b"aaabbc"));
//! assert_eq!(tree.to_string(), "6 *97:3 3 *99:1 *98:2");
//! assert_eq!(tree.paths().length(b'a'), Some(1));
//! ```

use std::fmt;
use std::ops::Index;

use bitvec::prelude::*;
use log::debug;

use crate::error::{HuffmanError, Result};
use crate::frequency::FrequencyTable;
use crate::heap::{FragmentHeap, FragmentKey};
use crate::node::{Node, NodeId};
use crate::stream::ByteSource;

/// Code path for every symbol that occurs in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    entries: Vec<Option<BitVec<u8, Lsb0>>>,
}

impl PathTable {
    fn new() -> Self {
        Self {
            entries: vec![None; 256],
        }
    }

    fn set(&mut self, symbol: u8, path: BitVec<u8, Lsb0>) {
        self.entries[symbol as usize] = Some(path);
    }

    /// Path bits for `symbol`, or `None` if it never occurred.
    pub fn get(&self, symbol: u8) -> Option<&BitSlice<u8, Lsb0>> {
        self.entries[symbol as usize].as_deref()
    }

    pub fn length(&self, symbol: u8) -> Option<usize> {
        self.get(symbol).map(|path| path.len())
    }

    /// Number of symbols with a path.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populated entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitSlice<u8, Lsb0>)> + '_ {
        (0..=u8::MAX).filter_map(move |symbol| self.get(symbol).map(|path| (symbol, path)))
    }
}

/// An immutable Huffman tree stored in an arena.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    paths: PathTable,
}

impl Tree {
    /// A tree with no root, produced by empty input.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            paths: PathTable::new(),
        }
    }

    /// Count the source's symbols and build a tree from them.
    ///
    /// The source is consumed; callers encoding afterwards must reset it.
    pub fn build<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let table = FrequencyTable::count(source)?;
        Ok(Self::from_frequencies(&table))
    }

    pub fn from_frequencies(table: &FrequencyTable) -> Self {
        let mut nodes: Vec<Node> = table
            .symbols()
            .map(|(symbol, count)| Node::leaf(symbol, count))
            .collect();
        if nodes.is_empty() {
            return Self::empty();
        }

        let leaves = nodes.len();
        nodes.reserve(leaves - 1);
        let mut heap: FragmentHeap = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| FragmentKey::of(NodeId(i), node))
            .collect();

        while heap.len() > 1 {
            let (Some(n1), Some(n2)) = (heap.pop(), heap.pop()) else {
                break;
            };
            let id = NodeId(nodes.len());
            let merged = Node::internal((n1.id, &nodes[n1.id.0]), (n2.id, &nodes[n2.id.0]));
            nodes[n1.id.0].parent = Some(id);
            nodes[n2.id.0].parent = Some(id);
            heap.push(FragmentKey::of(id, &merged));
            nodes.push(merged);
        }

        let root = heap.pop().map(|key| key.id);
        let tree = Self::from_arena(nodes, root);
        debug!(
            "built tree: {} leaves, {} internal nodes, max code length {}",
            tree.leaf_count(),
            tree.internal_count(),
            tree.max_code_length()
        );
        tree
    }

    /// Wrap a fully linked arena and generate paths.
    pub(crate) fn from_arena(nodes: Vec<Node>, root: Option<NodeId>) -> Self {
        let mut tree = Self {
            nodes,
            root,
            paths: PathTable::new(),
        };
        tree.generate_paths();
        tree
    }

    fn generate_paths(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        self.nodes[root.0].path.clear();

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            match (node.left, node.right) {
                (Some(left), Some(right)) => {
                    let path = node.path.clone();
                    for (child, bit) in [(right, true), (left, false)] {
                        let mut child_path = path.clone();
                        child_path.push(bit);
                        self.nodes[child.0].path = child_path;
                        stack.push(child);
                    }
                }
                _ => {
                    if let Some(symbol) = node.symbol() {
                        let path = node.path.clone();
                        self.paths.set(symbol, path);
                    }
                }
            }
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.map(|id| &self.nodes[id.0])
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn internal_count(&self) -> usize {
        self.node_count() - self.leaf_count()
    }

    /// Sum of all leaf counts: the number of symbols the tree encodes.
    pub fn total_symbols(&self) -> u64 {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(Node::count)
            .sum()
    }

    /// Nodes in pre-order: node, left subtree, right subtree.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Code length of every present symbol, in ascending symbol order.
    pub fn code_lengths(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.paths.iter().map(|(symbol, path)| (symbol, path.len()))
    }

    pub fn max_code_length(&self) -> usize {
        self.code_lengths().map(|(_, len)| len).max().unwrap_or(0)
    }

    /// Derive a node's path by following parent links up to the root.
    ///
    /// # Errors
    /// Returns `HuffmanError::InvalidNode` if `id` is not in this tree.
    pub fn path_via_parents(&self, id: NodeId) -> Result<BitVec<u8, Lsb0>> {
        if id.0 >= self.nodes.len() {
            return Err(HuffmanError::InvalidNode {
                index: id.0,
                len: self.nodes.len(),
            }
            .into());
        }

        let mut path = BitVec::<u8, Lsb0>::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(self.nodes[parent.0].right == Some(current));
            current = parent;
        }
        path.reverse();
        Ok(path)
    }
}

impl fmt::Display for Tree {
    /// Canonical form: internal nodes as `<count> <left> <right>`, leaves as
    /// `*<symbol>:<count>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.pre_order().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match node.symbol() {
                Some(symbol) => write!(f, "*{}:{}", symbol, node.count())?,
                None => write!(f, "{}", node.count())?,
            }
        }
        Ok(())
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

/// Iterator returned by [`Tree::pre_order`].
pub struct PreOrder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id.0];
        if let (Some(left), Some(right)) = (node.left, node.right) {
            self.stack.push(right);
            self.stack.push(left);
        }
        Some(node)
    }
}
