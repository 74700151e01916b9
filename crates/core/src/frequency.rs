//! Symbol frequency counting (first pass).

use crate::error::Result;
use crate::stream::ByteSource;

/// Occurrence counts for every byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Count every byte the source yields, consuming it once.
    pub fn count<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut table = Self::new();
        for byte in source.sequence() {
            table.add(byte?);
        }
        Ok(table)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::new();
        for &byte in data {
            table.add(byte);
        }
        table
    }

    /// Build a table from raw counts.
    pub fn from_counts(counts: [u64; 256]) -> Self {
        Self { counts }
    }

    pub fn add(&mut self, symbol: u8) {
        self.counts[symbol as usize] += 1;
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn counts(&self) -> &[u64; 256] {
        &self.counts
    }

    pub fn is_present(&self, symbol: u8) -> bool {
        self.counts[symbol as usize] > 0
    }

    /// Presence mask: `present[s]` is true iff `s` occurred at least once.
    pub fn present(&self) -> [bool; 256] {
        self.counts.map(|count| count > 0)
    }

    /// Present symbols in ascending order with their counts.
    pub fn symbols(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..=u8::MAX)
            .map(|symbol| (symbol, self.counts[symbol as usize]))
            .filter(|&(_, count)| count > 0)
    }

    pub fn distinct_symbols(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    /// Total bytes counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// True if no bytes were counted; no tree can be built from an empty table.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}
