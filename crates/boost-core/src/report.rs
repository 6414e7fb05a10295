//! Human-readable companion to the compiled trie.
//!
//! The report carries the boost map, the parameters it was computed with
//! and summary counts. The runtime never reads it; `boostc compile` can
//! turn one back into a binary trie.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::automaton::{write_atomic, BoostTrie};
use crate::boost::{boost_count, BoostMap, BoostParams};

pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported report version: {0}")]
    UnsupportedVersion(u32),
    #[error("boost key '{0}' is not a single character")]
    BadKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub prefix_count: usize,
    pub boost_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostReport {
    pub version: u32,
    pub target_language: String,
    pub source_language: String,
    pub parameters: BoostParams,
    pub stats: ReportStats,
    /// prefix → letter → boost. Letters are one-character strings.
    pub boosts: BTreeMap<String, BTreeMap<String, f64>>,
}

impl BoostReport {
    pub fn new(
        target: &str,
        baseline: &str,
        params: &BoostParams,
        boosts: &BoostMap,
        trie: &BoostTrie,
    ) -> Self {
        Self {
            version: REPORT_VERSION,
            target_language: target.to_string(),
            source_language: baseline.to_string(),
            parameters: params.clone(),
            stats: ReportStats {
                prefix_count: boosts.len(),
                boost_count: boost_count(boosts),
                node_count: trie.node_count(),
                edge_count: trie.edge_count(),
            },
            boosts: boosts
                .iter()
                .map(|(prefix, chars)| {
                    let chars = chars.iter().map(|(c, v)| (c.to_string(), *v)).collect();
                    (prefix.clone(), chars)
                })
                .collect(),
        }
    }

    /// Rebuild the boost map the report was written from.
    pub fn boost_map(&self) -> Result<BoostMap, ReportError> {
        let mut map = BoostMap::new();
        for (prefix, chars) in &self.boosts {
            let mut out = BTreeMap::new();
            for (key, value) in chars {
                let mut it = key.chars();
                let (Some(c), None) = (it.next(), it.next()) else {
                    return Err(ReportError::BadKey(key.clone()));
                };
                out.insert(c, *value);
            }
            map.insert(prefix.clone(), out);
        }
        Ok(map)
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let report: BoostReport = serde_json::from_str(json)?;
        if report.version != REPORT_VERSION {
            return Err(ReportError::UnsupportedVersion(report.version));
        }
        Ok(report)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }
}
