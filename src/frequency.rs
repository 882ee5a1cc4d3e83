//! Byte frequency analysis.
//!
//! Counts how often each byte value (0-255) occurs in a buffer. The table is
//! the only input the tree builder needs.

/// Occurrence count per byte value.
///
/// Only symbols with a non-zero count are part of the alphabet; `iter` yields
/// them in ascending symbol order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
    total: u64,
    distinct: usize,
}

impl FrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            counts: [0u64; 256],
            total: 0,
            distinct: 0,
        }
    }

    /// Count byte frequencies in `data`. O(N) time.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::new();
        table.count(data);
        table
    }

    /// Build a table from explicit `(symbol, count)` pairs.
    ///
    /// Zero counts are ignored and repeated symbols accumulate.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (u8, u64)>,
    {
        let mut table = Self::new();
        for (symbol, count) in counts {
            table.add(symbol, count);
        }
        table
    }

    /// Add every byte of `data` to the table.
    pub fn count(&mut self, data: &[u8]) {
        for &byte in data {
            self.add(byte, 1);
        }
    }

    fn add(&mut self, symbol: u8, count: u64) {
        if count == 0 {
            return;
        }
        let slot = &mut self.counts[symbol as usize];
        if *slot == 0 {
            self.distinct += 1;
        }
        *slot += count;
        self.total += count;
    }

    /// Count for a single symbol (0 if it never occurred).
    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Sum of all counts, equal to the length of the counted input.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct symbols observed.
    pub fn distinct(&self) -> usize {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }

    /// Observed symbols and their counts, in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }

    /// Shannon entropy of the distribution in bits per symbol.
    ///
    /// Returns 0.0 for an empty table.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.iter()
            .map(|(_, count)| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}
