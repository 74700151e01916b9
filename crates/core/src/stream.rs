//! Byte source and sink contracts the codec is driven through.
//!
//! The codec never opens files or sockets itself. It reads through a
//! [`ByteSource`] (which must be rewindable, since encoding makes two passes)
//! and writes through a [`ByteSink`] that caches bytes until flushed.
//!
//! Bits handed to a sink are packed least-significant-bit first: the first
//! bit of every group of eight lands in bit 0 of the output byte.

use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};

use bitvec::prelude::*;
use log::trace;

use crate::error::{BitIoError, Result};

/// Sequential byte supply with one byte of lookahead and rewind.
pub trait ByteSource {
    /// Return the next byte without consuming it, or `None` at end of stream.
    fn peek(&mut self) -> Result<Option<u8>>;

    /// Consume and return the next byte, or `None` at end of stream.
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Rewind to the position the source started at.
    fn reset(&mut self) -> Result<()>;

    /// Lazy, single-pass iteration over the remaining bytes.
    fn sequence(&mut self) -> Sequence<'_, Self> {
        Sequence { source: self }
    }
}

/// Iterator returned by [`ByteSource::sequence`].
pub struct Sequence<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<S: ByteSource + ?Sized> Iterator for Sequence<'_, S> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_byte().transpose()
    }
}

/// Buffered byte and bit sink.
pub trait ByteSink {
    /// Append bytes to the sink's cache.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Append whole bytes given as bits, LSB-first within each byte.
    ///
    /// # Errors
    /// Returns `BitIoError::UnalignedBits` if `bits.len()` is not a multiple of 8.
    fn write_bits(&mut self, bits: &BitSlice<u8, Lsb0>) -> Result<()>;

    /// Make all prior writes durable and reset the cached-byte counter.
    fn flush(&mut self) -> Result<()>;

    /// Bytes written since the last flush.
    fn bytes_cached_since_flush(&self) -> usize;
}

/// Pack bits into bytes, LSB-first.
pub(crate) fn pack_bytes(bits: &BitSlice<u8, Lsb0>) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(BitIoError::UnalignedBits { bits: bits.len() }.into());
    }
    Ok(bits.chunks_exact(8).map(|byte| byte.load_le::<u8>()).collect())
}

/// In-memory source over a byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl ByteSource for SliceSource<'_> {
    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.data.get(self.position).copied())
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.data.get(self.position).copied();
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }

    fn reset(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// Source over any seekable reader.
///
/// Reads are buffered. `reset` seeks back to the reader's position at
/// construction time, so a reader that was partially consumed before being
/// wrapped is rewound only to that point.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: BufReader<R>,
    start: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let start = reader.stream_position()?;
        Ok(Self {
            inner: BufReader::new(reader),
            start,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    fn fill(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn peek(&mut self) -> Result<Option<u8>> {
        self.fill()
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.fill()?;
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(self.start))?;
        Ok(())
    }
}

/// Sink that caches bytes in memory and writes them through on flush.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
    cache: Vec<u8>,
    /// Number of flushes performed
    flushes: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            cache: Vec::new(),
            flushes: 0,
        }
    }

    /// Number of times the cache has been written through.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush any cached bytes and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        ByteSink::flush(&mut self)?;
        Ok(self.inner)
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.cache.extend_from_slice(bytes);
        Ok(())
    }

    fn write_bits(&mut self, bits: &BitSlice<u8, Lsb0>) -> Result<()> {
        let bytes = pack_bytes(bits)?;
        self.cache.extend_from_slice(&bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        trace!("sink flush: {} bytes", self.cache.len());
        self.inner.write_all(&self.cache)?;
        self.inner.flush()?;
        self.cache.clear();
        self.flushes += 1;
        Ok(())
    }

    fn bytes_cached_since_flush(&self) -> usize {
        self.cache.len()
    }
}
