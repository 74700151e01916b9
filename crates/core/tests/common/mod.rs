//! Sample input generation for tests.
//!
//! Generated data mixes sections with different symbol distributions:
//! - Runs of a single byte (one-symbol trees, very short codes)
//! - Text-like data over a small alphabet
//! - Short repeating patterns
//! - Uniformly random bytes (long, nearly equal codes)
//!
//! Also provides a reader and a writer that fail on demand, for checking that
//! I/O errors reach the caller.

#![allow(dead_code)]

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate sample data with mixed symbol distributions.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_bytes`: exact size of generated data
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    let mut remaining = size_bytes;
    while remaining > 0 {
        let section = remaining.min(rng.gen_range(64..=4096));

        match rng.gen_range(0..10u8) {
            0..=2 => {
                let byte_value: u8 = rng.gen();
                data.extend(std::iter::repeat(byte_value).take(section));
            }
            3..=5 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                for _ in 0..section {
                    data.push(alphabet[rng.gen_range(0..alphabet.len())]);
                }
            }
            6..=7 => {
                let pattern = generate_pattern(&mut rng);
                data.extend(pattern.iter().copied().cycle().take(section));
            }
            _ => {
                for _ in 0..section {
                    data.push(rng.gen());
                }
            }
        }

        remaining -= section;
    }

    data
}

/// Data drawn from a skewed distribution over `alphabet` symbols.
pub fn generate_skewed_data(seed: u64, size_bytes: usize, alphabet: u8) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..size_bytes)
        .map(|_| {
            let r: f64 = rng.gen();
            ((r * r * alphabet as f64) as u8).min(alphabet.saturating_sub(1))
        })
        .collect()
}

fn generate_pattern(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let pattern_len = rng.gen_range(4..=32);
    (0..pattern_len).map(|_| rng.gen()).collect()
}

/// Writer whose every write fails with `kind`.
pub struct FailingWriter {
    pub kind: ErrorKind,
}

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(self.kind, "writer failed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Seekable reader over `data` that fails with `kind` once `fail_at` bytes
/// have been read.
pub struct FailingReader {
    data: Vec<u8>,
    position: usize,
    fail_at: usize,
    kind: ErrorKind,
}

impl FailingReader {
    pub fn new(data: Vec<u8>, fail_at: usize, kind: ErrorKind) -> Self {
        Self {
            data,
            position: 0,
            fail_at,
            kind,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.fail_at {
            return Err(io::Error::new(self.kind, "reader failed"));
        }
        let end = self.data.len().min(self.fail_at);
        let available = end.saturating_sub(self.position);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

impl Seek for FailingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => self.position as i64 + delta,
            SeekFrom::End(delta) => self.data.len() as i64 + delta,
        };
        if target < 0 {
            return Err(io::Error::new(ErrorKind::InvalidInput, "seek before start"));
        }
        self.position = target as usize;
        Ok(self.position as u64)
    }
}
