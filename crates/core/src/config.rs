//! Configuration for an encode session.
//!
//! The bit packer is bounded by two independent thresholds:
//! - `buffer_bits` (C1): capacity of the packer's own bit buffer
//! - `sink_flush_bytes` (C2): bytes the sink may cache before a forced flush
//!
//! Both default to 4096.

use crate::error::{Error, Result};

/// Default capacity of the packer's bit buffer, in bits.
pub const DEFAULT_BUFFER_BITS: usize = 4096;

/// Default number of bytes a sink may cache before the packer forces a flush.
pub const DEFAULT_SINK_FLUSH_BYTES: usize = 4096;

/// Most bits (packer) or bytes (decoder batch) reserved before any are written.
///
/// Thresholds above this still apply; the buffers grow into them on demand.
pub const MAX_PREALLOCATION: usize = 64 * 1024;

/// Resolved configuration for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bit buffer capacity (must be a positive multiple of 8)
    pub buffer_bits: usize,

    /// Sink cache threshold in bytes
    pub sink_flush_bytes: usize,
}

impl CodecConfig {
    /// Create a configuration with explicit thresholds.
    ///
    /// # Errors
    /// Returns `Error::Config` if either threshold is invalid (see [`validate`](Self::validate)).
    pub fn new(buffer_bits: usize, sink_flush_bytes: usize) -> Result<Self> {
        let config = Self {
            buffer_bits,
            sink_flush_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_buffer_bits(mut self, buffer_bits: usize) -> Self {
        self.buffer_bits = buffer_bits;
        self
    }

    pub fn with_sink_flush_bytes(mut self, sink_flush_bytes: usize) -> Self {
        self.sink_flush_bytes = sink_flush_bytes;
        self
    }

    /// Check the thresholds.
    ///
    /// A full buffer is handed to the sink as whole bytes, so `buffer_bits`
    /// must be a nonzero multiple of 8. There is no upper bound: a very large
    /// threshold just means the corresponding flush never happens.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_bits == 0 || self.buffer_bits % 8 != 0 {
            return Err(Error::Config(format!(
                "buffer_bits must be a positive multiple of 8, got {}",
                self.buffer_bits
            )));
        }
        if self.sink_flush_bytes == 0 {
            return Err(Error::Config(
                "sink_flush_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!(
            "Bit buffer: {} bits ({} bytes)",
            self.buffer_bits,
            self.buffer_bits / 8
        );
        println!("Sink flush threshold: {} bytes", self.sink_flush_bytes);
        println!();
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            buffer_bits: DEFAULT_BUFFER_BITS,
            sink_flush_bytes: DEFAULT_SINK_FLUSH_BYTES,
        }
    }
}
