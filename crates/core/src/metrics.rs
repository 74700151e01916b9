//! Metrics collection and reporting for encode and decode sessions.
//!
//! This module provides observable insights into codec behavior:
//! - Input and output sizes
//! - Tree shape (distinct symbols, frame size, average code length)
//! - Bit packer activity (buffer hand-offs, forced sink flushes)
//! - Timing information
//!
//! # Thread Safety
//!
//! `CodecMetrics` is plain data updated by a single session. Sessions are
//! strictly sequential, so no synchronization is involved.

use std::time::{Duration, Instant};

use crate::bitio::PackerStats;

/// Counters for one encode or decode session.
#[derive(Debug, Clone)]
pub struct CodecMetrics {
    // === Timing ===
    /// When the session started
    pub start_time: Instant,

    /// When the session ended (set on completion)
    pub end_time: Option<Instant>,

    // === Input/Output ===
    /// Symbols read from the source (encode) or emitted (decode)
    pub symbols: u64,

    /// Total bytes written: tree frame plus payload
    pub output_bytes: u64,

    // === Tree ===
    /// Number of distinct symbols (leaves)
    pub distinct_symbols: u64,

    /// Size of the serialized tree frame
    pub tree_bytes: u64,

    // === Payload ===
    /// Payload bits excluding padding
    pub payload_bits: u64,

    /// Payload bytes including the padded final byte
    pub payload_bytes: u64,

    /// Times the bit buffer was handed to the sink
    pub buffer_flushes: u64,

    /// Times the sink was flushed because it cached too much
    pub sink_flushes: u64,
}

impl CodecMetrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            symbols: 0,
            output_bytes: 0,
            distinct_symbols: 0,
            tree_bytes: 0,
            payload_bits: 0,
            payload_bytes: 0,
            buffer_flushes: 0,
            sink_flushes: 0,
        }
    }

    /// Fold the packer's counters into these metrics.
    pub fn record_packer(&mut self, stats: &PackerStats) {
        self.payload_bits += stats.bits_written;
        self.payload_bytes += stats.payload_bytes;
        self.buffer_flushes += stats.buffer_flushes;
        self.sink_flushes += stats.sink_flushes;
        self.output_bytes = self.tree_bytes + self.payload_bytes;
    }

    /// Mark the session as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compute compression ratio (output / input).
    ///
    /// Only meaningful for encode sessions: a decode session writes one byte
    /// per symbol, so its ratio is always 1.0. Returns 0.0 if there was no input.
    pub fn compression_ratio(&self) -> f64 {
        if self.symbols == 0 {
            0.0
        } else {
            self.output_bytes as f64 / self.symbols as f64
        }
    }

    /// Average payload bits per symbol.
    pub fn average_code_length(&self) -> f64 {
        if self.symbols == 0 {
            0.0
        } else {
            self.payload_bits as f64 / self.symbols as f64
        }
    }

    /// Symbols processed per second.
    pub fn symbols_per_second(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.symbols as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Codec Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("=== Tree ===");
        println!("Distinct symbols: {}", self.distinct_symbols);
        println!("Frame: {} bytes", self.tree_bytes);
        println!();

        println!("=== Payload ===");
        println!("Symbols: {}", self.symbols);
        println!("Bits: {} ({:.3} per symbol)", self.payload_bits, self.average_code_length());
        println!("Bytes: {}", self.payload_bytes);
        println!("Buffer flushes: {}", self.buffer_flushes);
        println!("Sink flushes: {}", self.sink_flushes);
        println!();

        println!("Output: {} bytes", self.output_bytes);
        println!("Ratio: {:.1}%", self.compression_ratio() * 100.0);
        println!(
            "Throughput: {:.2} M symbols/s",
            self.symbols_per_second() / 1_000_000.0
        );
        println!();
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             symbols={}\n\
             distinct_symbols={}\n\
             tree_bytes={}\n\
             payload_bits={}\n\
             payload_bytes={}\n\
             output_bytes={}\n\
             buffer_flushes={}\n\
             sink_flushes={}\n\
             compression_ratio={:.4}\n",
            self.duration().as_millis(),
            self.symbols,
            self.distinct_symbols,
            self.tree_bytes,
            self.payload_bits,
            self.payload_bytes,
            self.output_bytes,
            self.buffer_flushes,
            self.sink_flushes,
            self.compression_ratio(),
        )
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}
