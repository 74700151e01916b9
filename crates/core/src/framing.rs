//! Tree frame serialization and reconstruction.
//!
//! The frame describes the tree so a decoder can rebuild it without any
//! out-of-band metadata.
//!
//! # Frame Format
//!
//! ```text
//! +------------------+
//! | Magic (8 bytes)  |  "HUFFTREE"
//! +------------------+
//! | record (8)       |  one per node, pre-order
//! | ...              |  (2L-1 records for L distinct symbols)
//! +------------------+
//! | Footer (8 bytes) |  all zero
//! +------------------+
//! ```
//!
//! # Record Layout
//!
//! A record is a little-endian `u64`:
//! - bit 0: leaf flag
//! - bits 1..=55: low 55 bits of the node's count
//! - bits 56..=63: symbol (leaves only)
//!
//! Reconstruction is self-terminating: an internal record is always followed
//! by exactly its left and then its right subtree, so no node count is stored.
//! The footer is only a sentinel for detecting corruption.
//!
//! A frame with no tree is the header directly followed by the footer. A
//! real root record is never all zero (a leaf has its flag set and an
//! internal root counts at least two symbols), so an all-zero block in root
//! position is read as the footer.
//!
//! # Count Ceiling
//!
//! Counts above 2^55 - 1 are truncated to their low 55 bits. This is a hard
//! limit of the format and is not reported as an error.

use log::debug;

use crate::error::{FormatError, Result};
use crate::node::{Node, NodeId, Record, MAX_RECORD_COUNT};
use crate::stream::{ByteSink, ByteSource};
use crate::tree::Tree;

/// Magic header: "HUFFTREE"
pub const MAGIC: [u8; 8] = *b"HUFFTREE";

/// Footer sentinel
pub const FOOTER: [u8; 8] = [0; 8];

/// Size of the header, each record, and the footer
pub const BLOCK_SIZE: usize = 8;

/// Deepest an internal node can sit in a tree over 256 symbols.
const MAX_INTERNAL_DEPTH: usize = 254;

/// Total frame length for `tree`: header, records, footer.
pub fn frame_len(tree: &Tree) -> usize {
    BLOCK_SIZE * (tree.node_count() + 2)
}

/// Serialize `tree` into a standalone frame.
pub fn serialize_tree(tree: &Tree) -> Vec<u8> {
    let mut frame = Vec::with_capacity(frame_len(tree));
    frame.extend_from_slice(&MAGIC);
    for node in tree.pre_order() {
        frame.extend_from_slice(&node.record_bytes());
    }
    frame.extend_from_slice(&FOOTER);
    frame
}

/// Write `tree`'s frame to `sink`.
///
/// # Returns
/// Number of bytes written.
pub fn write_tree<K: ByteSink + ?Sized>(tree: &Tree, sink: &mut K) -> Result<usize> {
    sink.write_bytes(&MAGIC)?;
    for node in tree.pre_order() {
        sink.write_bytes(&node.record_bytes())?;
    }
    sink.write_bytes(&FOOTER)?;

    let len = frame_len(tree);
    debug!("wrote tree frame: {} records, {} bytes", tree.node_count(), len);
    Ok(len)
}

/// Read a tree frame from `source`, leaving it positioned at the payload.
///
/// # Errors
/// - `FormatError::InvalidHeader` if the magic does not match
/// - `FormatError::Truncated` if the source ends inside the frame
/// - `FormatError::InvalidFooter` if the block after the last record is not zero
/// - `FormatError::DuplicateSymbol`, `InternalWithSymbol`, `TreeTooDeep`, or
///   `CountMismatch` if the records do not describe a valid tree
pub fn read_tree<S: ByteSource + ?Sized>(source: &mut S) -> Result<Tree> {
    let header = read_block(source)?;
    if header != MAGIC {
        return Err(FormatError::InvalidHeader {
            expected: MAGIC,
            actual: header,
        }
        .into());
    }

    let first = read_block(source)?;
    if first == FOOTER {
        debug!("read tree frame: empty tree");
        return Ok(Tree::empty());
    }

    let mut reader = RecordReader {
        source,
        pending: Some(first),
        records: 0,
    };
    let mut nodes = Vec::new();
    let mut seen = [false; 256];
    let root = read_node(&mut reader, &mut nodes, &mut seen, 0)?;

    let footer = read_block(reader.source)?;
    if footer != FOOTER {
        return Err(FormatError::InvalidFooter { actual: footer }.into());
    }

    debug!("read tree frame: {} records", reader.records);
    Ok(Tree::from_arena(nodes, Some(root)))
}

struct RecordReader<'a, S: ?Sized> {
    source: &'a mut S,
    pending: Option<[u8; BLOCK_SIZE]>,
    records: usize,
}

impl<S: ByteSource + ?Sized> RecordReader<'_, S> {
    fn next(&mut self) -> Result<(usize, Record)> {
        let bytes = match self.pending.take() {
            Some(bytes) => bytes,
            None => read_block(self.source)?,
        };
        let index = self.records;
        self.records += 1;
        Ok((index, Record::from_bytes(bytes)))
    }
}

fn read_node<S: ByteSource + ?Sized>(
    reader: &mut RecordReader<'_, S>,
    nodes: &mut Vec<Node>,
    seen: &mut [bool; 256],
    depth: usize,
) -> Result<NodeId> {
    let (index, record) = reader.next()?;

    if record.is_leaf {
        if std::mem::replace(&mut seen[record.symbol as usize], true) {
            return Err(FormatError::DuplicateSymbol {
                symbol: record.symbol,
            }
            .into());
        }
        nodes.push(Node::leaf(record.symbol, record.count));
        return Ok(NodeId(nodes.len() - 1));
    }

    if record.symbol != 0 {
        return Err(FormatError::InternalWithSymbol {
            index,
            symbol: record.symbol,
        }
        .into());
    }
    if depth >= MAX_INTERNAL_DEPTH {
        return Err(FormatError::TreeTooDeep {
            max: MAX_INTERNAL_DEPTH + 1,
        }
        .into());
    }

    let left = read_node(reader, nodes, seen, depth + 1)?;
    let right = read_node(reader, nodes, seen, depth + 1)?;

    let expected = nodes[left.0].count().wrapping_add(nodes[right.0].count()) & MAX_RECORD_COUNT;
    if record.count != expected {
        return Err(FormatError::CountMismatch {
            index,
            stored: record.count,
            expected,
        }
        .into());
    }

    let id = NodeId(nodes.len());
    let node = Node::internal_with_count(
        (left, &nodes[left.0]),
        (right, &nodes[right.0]),
        record.count,
    );
    nodes[left.0].parent = Some(id);
    nodes[right.0].parent = Some(id);
    nodes.push(node);
    Ok(id)
}

/// Read one 8-byte block.
fn read_block<S: ByteSource + ?Sized>(source: &mut S) -> Result<[u8; BLOCK_SIZE]> {
    let mut block = [0u8; BLOCK_SIZE];
    for (i, slot) in block.iter_mut().enumerate() {
        match source.next_byte()? {
            Some(byte) => *slot = byte,
            None => {
                return Err(FormatError::Truncated {
                    required: BLOCK_SIZE,
                    actual: i,
                }
                .into())
            }
        }
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frequency::FrequencyTable;
    use crate::stream::{SliceSource, WriterSink};

    fn tree_of(data: &[u8]) -> Tree {
        Tree::from_frequencies(&FrequencyTable::from_bytes(data))
    }

    fn parse(frame: &[u8]) -> Result<Tree> {
        read_tree(&mut SliceSource::new(frame))
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let tree = tree_of(b"aaabbc");
        let frame = serialize_tree(&tree);

        assert_eq!(frame.len(), 8 + 5 * 8 + 8);
        assert_eq!(&frame[..8], b"HUFFTREE");
        assert_eq!(&frame[frame.len() - 8..], &[0u8; 8]);

        let parsed = parse(&frame).unwrap();
        assert_eq!(parsed.to_string(), tree.to_string());
        assert_eq!(parsed.paths(), tree.paths());
    }

    #[test]
    fn test_pre_order_records() {
        let frame = serialize_tree(&tree_of(b"aaabbc"));
        let records: Vec<Record> = frame[8..frame.len() - 8]
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                Record::from_bytes(bytes)
            })
            .collect();

        let summary: Vec<(bool, u64, u8)> = records
            .iter()
            .map(|r| (r.is_leaf, r.count, r.symbol))
            .collect();
        assert_eq!(
            summary,
            vec![
                (false, 6, 0),
                (true, 3, b'a'),
                (false, 3, 0),
                (true, 1, b'c'),
                (true, 2, b'b'),
            ]
        );
    }

    #[test]
    fn test_empty_tree_frame() {
        let frame = serialize_tree(&Tree::empty());
        assert_eq!(frame.len(), 16);

        let parsed = parse(&frame).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_write_tree_to_sink() {
        let tree = tree_of(b"abcd");
        let mut sink = WriterSink::new(Vec::new());
        let written = write_tree(&tree, &mut sink).unwrap();

        assert_eq!(written, 8 * (7 + 2));
        assert_eq!(sink.into_inner().unwrap(), serialize_tree(&tree));
    }

    #[test]
    fn test_invalid_header() {
        let mut frame = serialize_tree(&tree_of(b"ab"));
        frame[0] = b'X';
        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::InvalidHeader { .. }))
        ));
    }

    #[test]
    fn test_invalid_footer() {
        let mut frame = serialize_tree(&tree_of(b"ab"));
        let len = frame.len();
        frame[len - 1] = 1;
        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::InvalidFooter { .. }))
        ));
    }

    #[test]
    fn test_truncated_mid_tree() {
        let frame = serialize_tree(&tree_of(b"abcd"));
        // header + root + part of the next record
        let result = parse(&frame[..20]);
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::Truncated {
                required: 8,
                actual: 4
            }))
        ));
    }

    #[test]
    fn test_duplicate_symbol() {
        let leaf = Node::leaf(b'a', 1);
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&(2u64 << 1).to_le_bytes());
        frame.extend_from_slice(&leaf.record_bytes());
        frame.extend_from_slice(&leaf.record_bytes());
        frame.extend_from_slice(&FOOTER);

        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::DuplicateSymbol { symbol: b'a' }))
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&(5u64 << 1).to_le_bytes());
        frame.extend_from_slice(&Node::leaf(b'a', 1).record_bytes());
        frame.extend_from_slice(&Node::leaf(b'b', 1).record_bytes());
        frame.extend_from_slice(&FOOTER);

        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::CountMismatch {
                index: 0,
                stored: 5,
                expected: 2
            }))
        ));
    }

    #[test]
    fn test_internal_with_symbol() {
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&((2u64 << 1) | (7u64 << 56)).to_le_bytes());
        frame.extend_from_slice(&FOOTER);

        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::InternalWithSymbol { index: 0, symbol: 7 }))
        ));
    }

    #[test]
    fn test_too_deep() {
        let mut frame = MAGIC.to_vec();
        for _ in 0..300 {
            frame.extend_from_slice(&(2u64 << 1).to_le_bytes());
        }
        assert!(matches!(
            parse(&frame),
            Err(Error::Format(FormatError::TreeTooDeep { .. }))
        ));
    }

    #[test]
    fn test_full_alphabet() {
        let data: Vec<u8> = (0..=255).collect();
        let tree = tree_of(&data);
        let frame = serialize_tree(&tree);
        assert_eq!(frame.len(), 8 * (511 + 2));

        let parsed = parse(&frame).unwrap();
        assert_eq!(parsed.leaf_count(), 256);
        assert_eq!(parsed.to_string(), tree.to_string());
    }
}
