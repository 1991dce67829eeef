use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of distinct byte values, and so of slots in a [`FrequencyTable`].
pub const ALPHABET_SIZE: usize = 256;

/// Occurrence counts for every byte value, indexed by the unsigned byte.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET_SIZE],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: [0; ALPHABET_SIZE],
        }
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every byte of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = Self::new();
        for &b in bytes {
            table.increment(b);
        }
        table
    }

    pub(crate) fn from_counts(counts: [u64; ALPHABET_SIZE]) -> Self {
        Self { counts }
    }

    #[inline]
    pub fn increment(&mut self, symbol: u8) {
        self.counts[usize::from(symbol)] += 1;
    }

    #[inline]
    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[usize::from(symbol)]
    }

    /// All 256 counts in byte-value order, which is also the wire order.
    pub fn counts(&self) -> &[u64; ALPHABET_SIZE] {
        &self.counts
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Sum of all counts, or `None` if it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.counts.iter().try_fold(0u64, |acc, &c| acc.checked_add(c))
    }

    /// Number of byte values with a nonzero count.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Symbols with a nonzero count, in ascending byte order.
    pub fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..=u8::MAX)
            .zip(self.counts.iter().copied())
            .filter(|&(_, count)| count > 0)
    }
}

impl Index<u8> for FrequencyTable {
    type Output = u64;

    fn index(&self, symbol: u8) -> &u64 {
        &self.counts[usize::from(symbol)]
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // only the present symbols, 256 zeros are noise
        f.debug_map().entries(self.present()).finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableFrequencyTable {
    counts: Box<[u64]>,
}

impl<'a> From<&'a FrequencyTable> for SerializableFrequencyTable {
    fn from(other: &'a FrequencyTable) -> Self {
        Self {
            counts: other.counts.to_vec().into_boxed_slice(),
        }
    }
}

impl TryFrom<SerializableFrequencyTable> for FrequencyTable {
    type Error = Error;

    fn try_from(other: SerializableFrequencyTable) -> Result<Self> {
        let len = other.counts.len();
        let counts: [u64; ALPHABET_SIZE] = other
            .counts
            .into_vec()
            .try_into()
            .map_err(|_| Error::TableLength(len))?;

        Ok(Self::from_counts(counts))
    }
}
