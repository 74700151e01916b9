//! Bit-level I/O for the payload.
//!
//! This module provides [`BitPacker`], which turns code paths into
//! byte-aligned writes against a [`ByteSink`], and [`BitReader`], which reads
//! the payload back one bit at a time.
//!
//! Both operate LSB-first: the first bit of each byte is its least
//! significant bit.
//!
//! # Padding Rules
//! - BitPacker: pads the final partial byte with trailing zeros
//! - BitReader: cannot tell padding from data; the caller stops once it has
//!   decoded the expected number of symbols
//!
//! # Example
//! ```
//! use bitvec::prelude::*;
//! use huffpack_core::bitio::{BitPacker, BitReader};
//! use huffpack_core::config::CodecConfig;
//! use huffpack_core::stream::{SliceSource, WriterSink};
//!
//! let mut sink = WriterSink::new(Vec::new());
//! let mut packer = BitPacker::new(&mut sink, &CodecConfig::default()).unwrap();
//! packer.write_path(bits![u8, Lsb0; 1, 0, 1]).unwrap();
//! packer.write_path(bits![u8, Lsb0; 1, 1]).unwrap();
//! packer.finish().unwrap();
//!
//! let bytes = sink.into_inner().unwrap();
//! assert_eq!(bytes, vec![0b0001_1101]);
//!
//! let mut source = SliceSource::new(&bytes);
//! let mut reader = BitReader::new(&mut source);
//! assert_eq!(reader.read_bit().unwrap(), Some(true));
//! assert_eq!(reader.read_bit().unwrap(), Some(false));
//! ```

use bitvec::prelude::*;
use log::trace;

use crate::config::{CodecConfig, MAX_PREALLOCATION};
use crate::error::Result;
use crate::stream::{ByteSink, ByteSource};

/// Counters reported by [`BitPacker::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackerStats {
    /// Payload bits written, excluding padding
    pub bits_written: u64,
    /// Payload bytes handed to the sink, including the padded final byte
    pub payload_bytes: u64,
    /// Times the bit buffer was handed to the sink
    pub buffer_flushes: u64,
    /// Times the packer forced the sink to flush
    pub sink_flushes: u64,
}

/// Accumulates bits and writes them to a sink in whole bytes.
///
/// # Invariants
/// - `buffer.len() <= capacity`
/// - `capacity` is a positive multiple of 8
pub struct BitPacker<'a, K: ByteSink + ?Sized> {
    sink: &'a mut K,
    buffer: BitVec<u8, Lsb0>,
    /// C1: buffer capacity in bits
    capacity: usize,
    /// C2: sink cache limit in bytes
    sink_flush_bytes: usize,
    stats: PackerStats,
}

impl<'a, K: ByteSink + ?Sized> BitPacker<'a, K> {
    /// Create a packer writing to `sink`.
    ///
    /// # Errors
    /// Returns `Error::Config` if `config` is invalid.
    pub fn new(sink: &'a mut K, config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            buffer: BitVec::with_capacity(config.buffer_bits.min(MAX_PREALLOCATION)),
            capacity: config.buffer_bits,
            sink_flush_bytes: config.sink_flush_bytes,
            stats: PackerStats::default(),
        })
    }

    /// Append one bit, handing the buffer to the sink first if it is full.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.buffer.len() == self.capacity {
            self.flush_buffer()?;
        }
        self.buffer.push(bit);
        self.stats.bits_written += 1;

        if self.sink.bytes_cached_since_flush() > self.sink_flush_bytes {
            trace!(
                "sink holds {} bytes, forcing flush",
                self.sink.bytes_cached_since_flush()
            );
            self.sink.flush()?;
            self.stats.sink_flushes += 1;
        }
        Ok(())
    }

    /// Append every bit of `path` in order.
    pub fn write_path(&mut self, path: &BitSlice<u8, Lsb0>) -> Result<()> {
        for bit in path.iter().by_vals() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Bits written so far, excluding padding.
    pub fn bits_written(&self) -> u64 {
        self.stats.bits_written
    }

    /// Bits currently held in the buffer.
    pub fn buffered_bits(&self) -> usize {
        self.buffer.len()
    }

    /// Trim the buffer to whole bytes, hand it to the sink, and report counters.
    ///
    /// The sink itself is not flushed.
    pub fn finish(mut self) -> Result<PackerStats> {
        if !self.buffer.is_empty() {
            let padded = self.buffer.len().div_ceil(8) * 8;
            self.buffer.resize(padded, false);
            self.flush_buffer()?;
        }
        Ok(self.stats)
    }

    fn flush_buffer(&mut self) -> Result<()> {
        trace!("bit buffer flush: {} bits", self.buffer.len());
        self.sink.write_bits(&self.buffer)?;
        self.stats.payload_bytes += (self.buffer.len() / 8) as u64;
        self.stats.buffer_flushes += 1;
        self.buffer.clear();
        Ok(())
    }
}

/// Reads bits LSB-first from a byte source.
pub struct BitReader<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
    /// Remaining bits of the current byte, next bit in position 0
    current: u8,
    /// Number of unread bits in `current` (0-8)
    available: u8,
    bits_read: u64,
}

impl<'a, S: ByteSource + ?Sized> BitReader<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            current: 0,
            available: 0,
            bits_read: 0,
        }
    }

    /// Read one bit, or `None` once the source is exhausted.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        if self.available == 0 {
            match self.source.next_byte()? {
                Some(byte) => {
                    self.current = byte;
                    self.available = 8;
                }
                None => return Ok(None),
            }
        }
        let bit = self.current & 1 == 1;
        self.current >>= 1;
        self.available -= 1;
        self.bits_read += 1;
        Ok(Some(bit))
    }

    /// Bits consumed so far.
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Unread bits left in the current byte.
    pub fn pending_bits(&self) -> u8 {
        self.available
    }
}
