//! huffpack-core: deterministic Huffman tree framing and bit packing
//!
//! This library builds a Huffman prefix code for a byte stream, serializes
//! the code tree into a self-describing binary frame, and bit-packs the
//! stream's symbols against that code. The matching decoder rebuilds the tree
//! from the frame and walks it bit by bit.
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `stream`: Byte source and sink contracts, with in-memory and I/O adapters
//! - `frequency`: First-pass symbol counting
//! - `node`: Arena node model and the 8-byte node record
//! - `heap`: Binary min-heap of tree fragments
//! - `tree`: Tree construction and code path generation
//! - `framing`: Tree frame serialization and reconstruction
//! - `bitio`: Bounded-memory bit packer and payload bit reader
//! - `codec`: Two-pass encode and the decoder
//! - `config`: Packer thresholds
//! - `metrics`: Observable session behavior
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Bounded memory**: The packer's buffer and the sink's cache have fixed limits
//! - **Deterministic**: Fragment ordering is a strict total order, so equal
//!   inputs always give identical trees and identical output
//!
//! # Wire Format
//!
//! ```text
//! "HUFFTREE" | 2L-1 node records (pre-order) | 8 zero bytes | payload
//! ```
//!
//! Empty input produces only the header and footer.

pub mod bitio;
pub mod codec;
pub mod config;
pub mod error;
pub mod framing;
pub mod frequency;
pub mod heap;
pub mod metrics;
pub mod node;
pub mod stream;
pub mod tree;

// Re-export commonly used types
pub use codec::{compress, decode, decode_bytes, decode_to, encode, encode_bytes};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use stream::{ByteSink, ByteSource, ReaderSource, SliceSource, WriterSink};
pub use tree::Tree;
