//! Error types for the huffpack codec.
//!
//! All operations return structured errors rather than panicking.
//! Source and sink I/O failures are carried through unmodified.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: packing or unpacking bits against a byte stream
/// - Huffman: tree construction or symbol lookup failures
/// - Format: a tree frame or payload that cannot be decoded
/// - I/O: the underlying source or sink failed
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., handing a sink a partial byte)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Huffman codec error (e.g., symbol missing from the path table)
    #[error("huffman codec error: {0}")]
    Huffman(#[from] HuffmanError),

    /// Encoded frame is malformed or truncated
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Source or sink I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Sinks only accept whole bytes of bits
    #[error("unaligned bit write: {bits} bits is not a whole number of bytes")]
    UnalignedBits { bits: usize },
}

/// Huffman tree and code errors.
#[derive(Debug, Error)]
pub enum HuffmanError {
    /// The second pass produced a symbol the first pass never saw
    #[error("symbol {symbol} has no code in the path table")]
    UnknownSymbol { symbol: u8 },

    /// A node index did not refer to a node of this tree
    #[error("node index {index} out of range for tree of {len} nodes")]
    InvalidNode { index: usize, len: usize },
}

/// Tree frame and payload decoding errors.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Magic header does not match
    #[error("invalid header: expected {expected:02x?}, got {actual:02x?}")]
    InvalidHeader { expected: [u8; 8], actual: [u8; 8] },

    /// Footer after the last tree record is not all zero
    #[error("invalid footer: expected all zero, got {actual:02x?}")]
    InvalidFooter { actual: [u8; 8] },

    /// Stream ended in the middle of the header, a record, or the footer
    #[error("frame truncated: needed {required} bytes, got {actual}")]
    Truncated { required: usize, actual: usize },

    /// An internal record carries symbol bits
    #[error("internal record {index} has nonzero symbol bits {symbol:#04x}")]
    InternalWithSymbol { index: usize, symbol: u8 },

    /// Two leaves claim the same symbol
    #[error("symbol {symbol} appears in more than one leaf")]
    DuplicateSymbol { symbol: u8 },

    /// Tree nests deeper than any tree over 256 symbols can
    #[error("tree depth exceeds {max}")]
    TreeTooDeep { max: usize },

    /// Internal record count is not the sum of its children
    #[error("record {index} count {stored} does not match children sum {expected}")]
    CountMismatch { index: usize, stored: u64, expected: u64 },

    /// Payload ended before every symbol was decoded
    #[error("payload truncated: decoded {decoded} of {expected} symbols")]
    TruncatedPayload { decoded: u64, expected: u64 },

    /// Decoding reached a node that is neither a symbol leaf nor a full branch
    #[error("node {index} has no symbol and fewer than two children")]
    DanglingNode { index: usize },

    /// Bytes follow the footer of a frame that has no tree
    #[error("payload present but frame has no tree")]
    PayloadWithoutTree,
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
