//! Encode and decode sessions.
//!
//! Encoding makes two passes over the source: the first counts symbol
//! frequencies and builds the tree, the second packs each symbol's path.
//! The output is the tree frame (see [`framing`](crate::framing)) followed
//! directly by the payload.
//!
//! The payload carries no length field. The decoder takes the number of
//! symbols to emit from the tree itself (the sum of its leaf counts) and
//! ignores whatever padding bits follow the last symbol.
//!
//! # Example
//! ```
//! use huffpack_core::codec::{decode_bytes, encode_bytes};
//!
//! let encoded = encode_bytes(b"abracadabra").unwrap();
//! assert_eq!(decode_bytes(&encoded).unwrap(), b"abracadabra");
//! ```

use log::{debug, info};

use crate::bitio::{BitPacker, BitReader};
use crate::config::{CodecConfig, MAX_PREALLOCATION};
use crate::error::{FormatError, HuffmanError, Result};
use crate::framing;
use crate::metrics::CodecMetrics;
use crate::node::NodeId;
use crate::stream::{ByteSink, ByteSource, SliceSource, WriterSink};
use crate::tree::Tree;

/// Write `tree`'s frame, then pack every symbol of `source` against it.
///
/// `source` is read from its current position to the end; for a tree built
/// from the same source, reset it first. The sink is flushed on success.
///
/// # Errors
/// - `HuffmanError::UnknownSymbol` if `source` yields a symbol the tree lacks
/// - `Error::Config` if `config` is invalid
/// - Propagates source and sink I/O errors
pub fn encode<S, K>(
    tree: &Tree,
    source: &mut S,
    sink: &mut K,
    config: &CodecConfig,
) -> Result<CodecMetrics>
where
    S: ByteSource + ?Sized,
    K: ByteSink + ?Sized,
{
    config.validate()?;

    let mut metrics = CodecMetrics::new();
    metrics.distinct_symbols = tree.leaf_count() as u64;
    metrics.tree_bytes = framing::write_tree(tree, sink)? as u64;

    let mut packer = BitPacker::new(sink, config)?;
    for byte in source.sequence() {
        let symbol = byte?;
        let path = tree
            .paths()
            .get(symbol)
            .ok_or(HuffmanError::UnknownSymbol { symbol })?;
        packer.write_path(path)?;
        metrics.symbols += 1;
    }
    let stats = packer.finish()?;
    metrics.record_packer(&stats);

    sink.flush()?;
    metrics.complete();

    info!(
        "encoded {} symbols into {} bytes ({} tree, {} payload)",
        metrics.symbols, metrics.output_bytes, metrics.tree_bytes, metrics.payload_bytes
    );
    Ok(metrics)
}

/// Run both passes: build the tree from `source`, rewind it, and encode.
pub fn compress<S, K>(source: &mut S, sink: &mut K, config: &CodecConfig) -> Result<CodecMetrics>
where
    S: ByteSource + ?Sized,
    K: ByteSink + ?Sized,
{
    config.validate()?;
    let tree = Tree::build(source)?;
    source.reset()?;
    encode(&tree, source, sink, config)
}

/// Decode a frame and payload from `source`, writing symbols to `sink`.
///
/// Output is handed to the sink in batches of at most
/// `config.sink_flush_bytes`, and the sink is flushed whenever it caches more
/// than that. The sink is flushed on success.
///
/// # Errors
/// - Any `FormatError` from reading the tree frame
/// - `FormatError::PayloadWithoutTree` if bytes follow an empty frame
/// - `FormatError::TruncatedPayload` if the payload ends early
/// - `FormatError::DanglingNode` if decoding lands on a node without a symbol
/// - Propagates source and sink I/O errors
pub fn decode_to<S, K>(source: &mut S, sink: &mut K, config: &CodecConfig) -> Result<CodecMetrics>
where
    S: ByteSource + ?Sized,
    K: ByteSink + ?Sized,
{
    config.validate()?;

    let mut metrics = CodecMetrics::new();
    let tree = framing::read_tree(source)?;
    metrics.distinct_symbols = tree.leaf_count() as u64;
    metrics.tree_bytes = framing::frame_len(&tree) as u64;

    let total = tree.total_symbols();
    let mut out = OutputBatch::new(sink, config.sink_flush_bytes);

    match tree.root() {
        None => {
            if source.peek()?.is_some() {
                return Err(FormatError::PayloadWithoutTree.into());
            }
        }
        Some(root) if tree[root].is_leaf() => {
            // A lone leaf has an empty path: emit it `count` times, read no bits
            let symbol = leaf_symbol(&tree, root)?;
            for _ in 0..total {
                out.push(symbol)?;
            }
        }
        Some(root) => {
            let mut reader = BitReader::new(source);
            for decoded in 0..total {
                let mut current = root;
                while let (Some(left), Some(right)) = (tree[current].left(), tree[current].right()) {
                    let bit = reader.read_bit()?.ok_or(FormatError::TruncatedPayload {
                        decoded,
                        expected: total,
                    })?;
                    current = if bit { right } else { left };
                }
                out.push(leaf_symbol(&tree, current)?)?;
            }
            metrics.payload_bits = reader.bits_read();
            metrics.payload_bytes = metrics.payload_bits.div_ceil(8);
            debug!(
                "decoded payload: {} bits, {} padding bits ignored",
                metrics.payload_bits,
                reader.pending_bits()
            );
        }
    }

    metrics.sink_flushes = out.finish()?;
    metrics.symbols = total;
    metrics.output_bytes = total;
    metrics.complete();

    info!(
        "decoded {} symbols from {} tree bytes and {} payload bytes",
        metrics.symbols, metrics.tree_bytes, metrics.payload_bytes
    );
    Ok(metrics)
}

/// Decode a frame and payload from `source` into memory.
pub fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<u8>> {
    let mut sink = WriterSink::new(Vec::new());
    decode_to(source, &mut sink, &CodecConfig::default())?;
    sink.into_inner()
}

/// Compress an in-memory buffer with the default configuration.
pub fn encode_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut source = SliceSource::new(data);
    let mut sink = WriterSink::new(Vec::new());
    compress(&mut source, &mut sink, &CodecConfig::default())?;
    sink.into_inner()
}

/// Decompress an in-memory buffer.
pub fn decode_bytes(encoded: &[u8]) -> Result<Vec<u8>> {
    decode(&mut SliceSource::new(encoded))
}

fn leaf_symbol(tree: &Tree, id: NodeId) -> Result<u8> {
    tree[id]
        .symbol()
        .ok_or_else(|| FormatError::DanglingNode { index: id.index() }.into())
}

/// Batches decoded symbols before handing them to the sink.
struct OutputBatch<'a, K: ?Sized> {
    sink: &'a mut K,
    pending: Vec<u8>,
    limit: usize,
    sink_flushes: u64,
}

impl<'a, K: ByteSink + ?Sized> OutputBatch<'a, K> {
    fn new(sink: &'a mut K, limit: usize) -> Self {
        Self {
            sink,
            pending: Vec::with_capacity(limit.min(MAX_PREALLOCATION)),
            limit,
            sink_flushes: 0,
        }
    }

    fn push(&mut self, symbol: u8) -> Result<()> {
        self.pending.push(symbol);
        if self.pending.len() >= self.limit {
            self.write_pending()?;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<()> {
        self.sink.write_bytes(&self.pending)?;
        self.pending.clear();
        if self.sink.bytes_cached_since_flush() > self.limit {
            self.sink.flush()?;
            self.sink_flushes += 1;
        }
        Ok(())
    }

    /// Write what is left and flush the sink; returns forced flushes.
    fn finish(mut self) -> Result<u64> {
        if !self.pending.is_empty() {
            self.write_pending()?;
        }
        self.sink.flush()?;
        Ok(self.sink_flushes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::framing::{FOOTER, MAGIC};

    #[test]
    fn test_round_trip() {
        let data = b"hello world! this is a test.";
        let encoded = encode_bytes(data).unwrap();
        assert_eq!(decode_bytes(&encoded).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let encoded = encode_bytes(b"").unwrap();
        let mut expected = MAGIC.to_vec();
        expected.extend_from_slice(&FOOTER);
        assert_eq!(encoded, expected);
        assert!(decode_bytes(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_single_symbol_has_no_payload() {
        let encoded = encode_bytes(b"a").unwrap();
        // header, one leaf record, footer
        assert_eq!(encoded.len(), 24);
        assert_eq!(decode_bytes(&encoded).unwrap(), b"a");

        let encoded = encode_bytes(&[b'X'; 10_000]).unwrap();
        assert_eq!(encoded.len(), 24);
        assert_eq!(decode_bytes(&encoded).unwrap(), vec![b'X'; 10_000]);
    }

    #[test]
    fn test_single_symbol_reads_no_payload_bits() {
        let mut encoded = encode_bytes(b"a").unwrap();
        encoded.extend_from_slice(&[0xFF, 0x00, 0xAB]);

        let mut source = SliceSource::new(&encoded);
        let mut out = WriterSink::new(Vec::new());
        let metrics = decode_to(&mut source, &mut out, &CodecConfig::default()).unwrap();

        assert_eq!(metrics.payload_bits, 0);
        assert_eq!(metrics.payload_bytes, 0);
        assert_eq!(source.position(), 24);
        assert_eq!(out.into_inner().unwrap(), b"a");
    }

    #[test]
    fn test_huge_thresholds() {
        let data = b"never flush until the very end".repeat(50);
        let config = CodecConfig::new(usize::MAX - 7, usize::MAX).unwrap();

        let mut sink = WriterSink::new(Vec::new());
        let metrics = compress(&mut SliceSource::new(&data), &mut sink, &config).unwrap();
        assert_eq!(metrics.buffer_flushes, 1);
        assert_eq!(metrics.sink_flushes, 0);
        let encoded = sink.into_inner().unwrap();
        assert_eq!(encoded, encode_bytes(&data).unwrap());

        let config = CodecConfig::new(4096, usize::MAX).unwrap();
        let mut out = WriterSink::new(Vec::new());
        decode_to(&mut SliceSource::new(&encoded), &mut out, &config).unwrap();
        assert_eq!(out.into_inner().unwrap(), data);
    }

    #[test]
    fn test_leaf_symbol_rejects_branch() {
        let tree = Tree::build(&mut SliceSource::new(b"ab")).unwrap();
        let root = tree.root().unwrap();
        assert!(matches!(
            leaf_symbol(&tree, root),
            Err(Error::Format(FormatError::DanglingNode { index })) if index == root.index()
        ));

        let left = tree[root].left().unwrap();
        assert_eq!(leaf_symbol(&tree, left).unwrap(), b'a');
    }

    #[test]
    fn test_payload_bits() {
        // a=0, c=10, b=11
        let encoded = encode_bytes(b"aaabbc").unwrap();
        let payload = &encoded[8 + 5 * 8 + 8..];
        // bits in order: 0 0 0 1 1 1 1 1 | 0, then padding
        assert_eq!(payload, &[0b1111_1000, 0b0000_0000]);
    }

    #[test]
    fn test_metrics() {
        let data = b"aaabbc";
        let mut source = SliceSource::new(data);
        let mut sink = WriterSink::new(Vec::new());
        let metrics = compress(&mut source, &mut sink, &CodecConfig::default()).unwrap();

        assert_eq!(metrics.symbols, 6);
        assert_eq!(metrics.distinct_symbols, 3);
        assert_eq!(metrics.tree_bytes, 56);
        assert_eq!(metrics.payload_bits, 9);
        assert_eq!(metrics.payload_bytes, 2);
        assert_eq!(metrics.output_bytes, 58);

        let encoded = sink.into_inner().unwrap();
        assert_eq!(encoded.len(), 58);

        let mut out = WriterSink::new(Vec::new());
        let decoded =
            decode_to(&mut SliceSource::new(&encoded), &mut out, &CodecConfig::default()).unwrap();
        assert_eq!(decoded.symbols, 6);
        assert_eq!(decoded.payload_bits, 9);
        assert_eq!(out.into_inner().unwrap(), data);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut encoded = encode_bytes(b"abcabcabd").unwrap();
        encoded.extend_from_slice(&[0xAA, 0x55]);
        assert_eq!(decode_bytes(&encoded).unwrap(), b"abcabcabd");
    }

    #[test]
    fn test_truncated_payload() {
        let mut encoded = encode_bytes(b"the rain in spain").unwrap();
        encoded.pop();
        assert!(matches!(
            decode_bytes(&encoded),
            Err(Error::Format(FormatError::TruncatedPayload { .. }))
        ));
    }

    #[test]
    fn test_payload_without_tree() {
        let mut encoded = encode_bytes(b"").unwrap();
        encoded.push(0);
        assert!(matches!(
            decode_bytes(&encoded),
            Err(Error::Format(FormatError::PayloadWithoutTree))
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let tree = Tree::build(&mut SliceSource::new(b"aab")).unwrap();
        let mut sink = WriterSink::new(Vec::new());
        let result = encode(
            &tree,
            &mut SliceSource::new(b"abc"),
            &mut sink,
            &CodecConfig::default(),
        );
        assert!(matches!(
            result,
            Err(Error::Huffman(HuffmanError::UnknownSymbol { symbol: b'c' }))
        ));
    }

    #[test]
    fn test_small_thresholds() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 13) as u8).collect();
        let config = CodecConfig::new(16, 3).unwrap();

        let mut sink = WriterSink::new(Vec::new());
        let metrics = compress(&mut SliceSource::new(&data), &mut sink, &config).unwrap();
        assert!(metrics.buffer_flushes > 1);
        assert!(metrics.sink_flushes > 1);
        let encoded = sink.into_inner().unwrap();

        assert_eq!(encoded, encode_bytes(&data).unwrap());

        let mut out = WriterSink::new(Vec::new());
        decode_to(&mut SliceSource::new(&encoded), &mut out, &config).unwrap();
        assert_eq!(out.into_inner().unwrap(), data);
    }
}
