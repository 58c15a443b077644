//! Token bloom filters attached to encoded columns.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::tokenizer::hash_token;

/// Sizing parameters for bloom filters built at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Bits reserved per distinct token.
    pub bits_per_item: usize,
    /// Number of probes per token.
    pub hashes: usize,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            bits_per_item: 16,
            hashes: 6,
        }
    }
}

impl BloomConfig {
    /// Set bits per item.
    pub fn bits_per_item(mut self, bits: usize) -> Self {
        self.bits_per_item = bits.max(1);
        self
    }

    /// Set the probe count.
    pub fn hashes(mut self, hashes: usize) -> Self {
        self.hashes = hashes.max(1);
        self
    }
}

/// Probabilistic set of token hashes.
///
/// `contains_all` never returns a false negative. A filter with no bits
/// answers "possibly present" for everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u64>,
    hashes: usize,
}

impl BloomFilter {
    /// Build a filter holding `tokens`.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], config: BloomConfig) -> Self {
        let hashes: Vec<u64> = tokens.iter().map(|t| hash_token(t.as_ref())).collect();
        Self::from_hashes(&hashes, config)
    }

    /// Build a filter holding pre-computed token hashes.
    pub fn from_hashes(hashes: &[u64], config: BloomConfig) -> Self {
        let probes = config.hashes.max(1);
        if hashes.is_empty() {
            return Self {
                bits: Vec::new(),
                hashes: probes,
            };
        }
        let words = (hashes.len() * config.bits_per_item.max(1)).div_ceil(64);
        let mut bf = Self {
            bits: vec![0; words],
            hashes: probes,
        };
        let max_bits = bf.max_bits();
        for &h in hashes {
            for i in 0..probes {
                let bit = probe(h, i, max_bits);
                bf.bits[bit / 64] |= 1u64 << (bit % 64);
            }
        }
        bf
    }

    /// Whether every hash is possibly in the filter.
    pub fn contains_all(&self, hashes: &[u64]) -> bool {
        if self.bits.is_empty() {
            return true;
        }
        let max_bits = self.max_bits();
        hashes.iter().all(|&h| {
            (0..self.hashes).all(|i| {
                let bit = probe(h, i, max_bits);
                self.bits[bit / 64] & (1u64 << (bit % 64)) != 0
            })
        })
    }

    /// Whether any of the hash sets is fully possibly in the filter.
    pub fn contains_any_set(&self, hash_sets: &[Vec<u64>]) -> bool {
        hash_sets.iter().any(|set| self.contains_all(set))
    }

    /// Size of the bit array in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bits.len() * 8
    }

    fn max_bits(&self) -> u64 {
        self.bits.len() as u64 * 64
    }
}

#[inline]
fn probe(hash: u64, i: usize, max_bits: u64) -> usize {
    let h = xxh64(&hash.wrapping_add(i as u64).to_le_bytes(), 0);
    (h % max_bits) as usize
}
