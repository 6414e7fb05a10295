//! Weighted (prefix, next-character) continuation counts.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::corpus::FrequencyCorpus;
use crate::unicode::{char_index, index_char};

/// Default longest prefix whose continuations are counted.
pub const DEFAULT_MAX_PREFIX_LEN: usize = 4;

/// Log-damped word weight: `round(ln(freq + 1) * 10)`, at least 1.
///
/// Keeps a handful of very common words from swamping rarer but
/// distinctive prefixes.
pub fn damped_weight(freq: u32) -> u64 {
    let w = ((f64::from(freq) + 1.0).ln() * 10.0).round();
    (w as u64).max(1)
}

/// Per-prefix counts for each of the 26 continuation letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounts([u64; 26]);

impl Default for CharCounts {
    fn default() -> Self {
        CharCounts([0; 26])
    }
}

impl CharCounts {
    /// Count for `c`; 0 for anything outside `a..=z`.
    pub fn get(&self, c: char) -> u64 {
        char_index(c).map_or(0, |i| self.0[i as usize])
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Non-zero entries in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .filter_map(|(i, &n)| index_char(i as u8).map(|c| (c, n)))
    }

    fn add(&mut self, idx: u8, weight: u64) {
        self.0[idx as usize] += weight;
    }

    fn merge(&mut self, other: &CharCounts) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b;
        }
    }
}

/// Prefix → continuation counts for one language.
///
/// A prefix absent from the table has a zero count for every letter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuationTable {
    max_prefix_len: usize,
    prefixes: HashMap<String, CharCounts>,
}

impl ContinuationTable {
    pub fn new(max_prefix_len: usize) -> Self {
        Self {
            max_prefix_len,
            prefixes: HashMap::new(),
        }
    }

    /// Accumulate the whole corpus. Words are split across rayon workers
    /// and the partial tables merged by addition.
    pub fn from_corpus(corpus: &FrequencyCorpus, max_prefix_len: usize) -> Self {
        let _span = debug_span!("continuations", words = corpus.len(), max_prefix_len).entered();
        let table = corpus
            .entries()
            .par_iter()
            .fold(
                || ContinuationTable::new(max_prefix_len),
                |mut table, &(word, freq)| {
                    table.add_word(word, freq);
                    table
                },
            )
            .reduce(
                || ContinuationTable::new(max_prefix_len),
                ContinuationTable::merge,
            );
        debug!(prefixes = table.len());
        table
    }

    /// Add every substring of length `1..=max_prefix_len` of `word` that is
    /// followed by a plain letter.
    pub fn add_word(&mut self, word: &str, freq: u32) {
        // Normalized words are ASCII, so byte offsets are char offsets.
        let bytes = word.as_bytes();
        let weight = damped_weight(freq);
        for len in 1..=self.max_prefix_len {
            if bytes.len() <= len {
                break;
            }
            for start in 0..bytes.len() - len {
                let Some(next) = char_index(bytes[start + len] as char) else {
                    continue;
                };
                let Some(prefix) = word.get(start..start + len) else {
                    continue;
                };
                match self.prefixes.get_mut(prefix) {
                    Some(counts) => counts.add(next, weight),
                    None => {
                        let mut counts = CharCounts::default();
                        counts.add(next, weight);
                        self.prefixes.insert(prefix.to_string(), counts);
                    }
                }
            }
        }
    }

    /// Combine two partial tables; addition is commutative and associative.
    pub fn merge(mut self, other: ContinuationTable) -> ContinuationTable {
        self.max_prefix_len = self.max_prefix_len.max(other.max_prefix_len);
        for (prefix, counts) in other.prefixes {
            self.prefixes.entry(prefix).or_default().merge(&counts);
        }
        self
    }

    pub fn get(&self, prefix: &str) -> Option<&CharCounts> {
        self.prefixes.get(prefix)
    }

    pub fn count(&self, prefix: &str, c: char) -> u64 {
        self.get(prefix).map_or(0, |counts| counts.get(c))
    }

    pub fn total(&self, prefix: &str) -> u64 {
        self.get(prefix).map_or(0, CharCounts::total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CharCounts)> {
        self.prefixes.iter().map(|(p, c)| (p.as_str(), c))
    }

    pub fn max_prefix_len(&self) -> usize {
        self.max_prefix_len
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
