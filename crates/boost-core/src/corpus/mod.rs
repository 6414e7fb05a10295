//! Word-frequency corpora.
//!
//! A corpus maps normalized words to positive weights. Two on-disk formats
//! are accepted: the tagged binary dictionary (`CKDT`) and a flat JSON
//! object of word → frequency. Both readers are lenient: bad records are
//! skipped with a warning and never abort the whole read.

mod binary;
mod json;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, debug_span, info};

use crate::unicode::normalize;

pub use binary::{encode_binary, BINARY_HEADER_SIZE, BINARY_MAGIC};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no corpus for '{lang}' in {dir}")]
    NotFound { lang: String, dir: PathBuf },
}

/// Immutable word → weight table for one language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyCorpus {
    words: HashMap<String, u32>,
}

impl FrequencyCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw (un-normalized) words.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut corpus = Self::new();
        for (word, weight) in pairs {
            corpus.insert(word.as_ref(), weight);
        }
        corpus
    }

    /// Normalize `word` and record it. Weights are floored at 1; when two
    /// raw words share a normalized form the larger weight is kept.
    /// Returns `false` if the word normalizes to nothing.
    pub(crate) fn insert(&mut self, word: &str, weight: u32) -> bool {
        let key = normalize(word);
        if key.is_empty() {
            return false;
        }
        let weight = weight.max(1);
        self.words
            .entry(key)
            .and_modify(|w| *w = (*w).max(weight))
            .or_insert(weight);
        true
    }

    pub fn get(&self, word: &str) -> Option<u32> {
        self.words.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words.iter().map(|(w, &f)| (w.as_str(), f))
    }

    /// Words and weights as a slice-friendly vector, for partitioned work.
    pub(crate) fn entries(&self) -> Vec<(&str, u32)> {
        self.iter().collect()
    }
}

/// On-disk corpus representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Binary,
    Json,
}

impl CorpusFormat {
    /// Choose a format by extension, falling back to the magic bytes.
    pub fn detect(path: &Path, data: &[u8]) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => CorpusFormat::Binary,
            Some("json") => CorpusFormat::Json,
            _ if data.starts_with(BINARY_MAGIC) => CorpusFormat::Binary,
            _ => CorpusFormat::Json,
        }
    }

    pub fn parse(self, data: &[u8]) -> FrequencyCorpus {
        match self {
            CorpusFormat::Binary => binary::parse_binary(data),
            CorpusFormat::Json => json::parse_json(data),
        }
    }
}

/// Read a corpus file in either format.
pub fn load(path: &Path) -> Result<FrequencyCorpus, CorpusError> {
    let _span = debug_span!("load_corpus", path = %path.display()).entered();
    let data = fs::read(path)?;
    let format = CorpusFormat::detect(path, &data);
    debug!(?format, bytes = data.len());
    let corpus = format.parse(&data);
    info!(path = %path.display(), words = corpus.len(), "loaded corpus");
    Ok(corpus)
}

/// Find the corpus for `lang` in `dir`, preferring the binary format.
///
/// Every language uses the same order, the baseline included. Older build
/// scripts looked for the English baseline as `.json` first, so a directory
/// holding both `en_enhanced.bin` and `en_enhanced.json` now resolves to the
/// binary file.
pub fn locate(dir: &Path, lang: &str) -> Result<PathBuf, CorpusError> {
    ["bin", "json"]
        .iter()
        .map(|ext| dir.join(format!("{lang}_enhanced.{ext}")))
        .find(|p| p.is_file())
        .ok_or_else(|| CorpusError::NotFound {
            lang: lang.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// [`locate`] then [`load`].
pub fn load_language(dir: &Path, lang: &str) -> Result<FrequencyCorpus, CorpusError> {
    load(&locate(dir, lang)?)
}
