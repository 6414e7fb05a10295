//! Per-language orchestration.
//!
//! The baseline corpus is loaded once into an immutable continuation table
//! shared by every target language. Each target is processed independently
//! and its failure is recorded in its own result, never aborting the batch.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, debug_span, info, warn};

use crate::automaton::{BoostTrie, FormatError};
use crate::boost::{boost_count, compute_boosts, BoostMap};
use crate::config::{self, BuildConfig, ConfigError};
use crate::corpus::{self, CorpusError, FrequencyCorpus};
use crate::report::{BoostReport, ReportError};
use crate::stats::ContinuationTable;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),
    #[error("automaton: {0}")]
    Format(#[from] FormatError),
    #[error("report: {0}")]
    Report(#[from] ReportError),
}

#[derive(Debug)]
pub enum LanguageOutcome {
    Built {
        prefixes: usize,
        boosts: usize,
        node_count: usize,
        edge_count: usize,
    },
    /// Nothing cleared the threshold. Root-only artifacts are still written.
    NoBoosts,
    /// The language is the baseline itself.
    Skipped,
    Failed(PipelineError),
}

#[derive(Debug)]
pub struct LanguageResult {
    pub lang: String,
    pub outcome: LanguageOutcome,
}

/// Per-language results, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<LanguageResult>,
}

impl BatchReport {
    pub fn built_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, LanguageOutcome::Built { .. }))
            .count()
    }

    /// Languages that were actually attempted (baseline excluded).
    pub fn attempted_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !matches!(r.outcome, LanguageOutcome::Skipped))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            LanguageOutcome::Failed(e) => Some((r.lang.as_str(), e)),
            _ => None,
        })
    }
}

/// Everything produced for one target language before it touches disk.
#[derive(Debug, Clone)]
pub struct LanguageArtifacts {
    pub boosts: BoostMap,
    pub trie: BoostTrie,
    pub report: BoostReport,
}

pub struct Orchestrator {
    config: BuildConfig,
    baseline: Arc<ContinuationTable>,
}

impl Orchestrator {
    /// Validate `config`, then load and tabulate the baseline corpus.
    /// A missing baseline is fatal for the whole run.
    pub fn load_baseline(config: BuildConfig) -> Result<Self, PipelineError> {
        config::validate(&config)?;
        let _span = debug_span!("load_baseline", lang = config.baseline.as_str()).entered();
        let corpus = corpus::load_language(&config.dict_dir, &config.baseline)?;
        if corpus.is_empty() {
            warn!(lang = config.baseline.as_str(), "baseline corpus is empty");
        }
        Ok(Self::with_baseline_corpus(config, &corpus))
    }

    /// Use an already loaded baseline corpus.
    pub fn with_baseline_corpus(config: BuildConfig, baseline: &FrequencyCorpus) -> Self {
        let table = ContinuationTable::from_corpus(baseline, config.boost.max_prefix_len);
        info!(
            lang = config.baseline.as_str(),
            words = baseline.len(),
            prefixes = table.len(),
            "baseline ready"
        );
        Self {
            config,
            baseline: Arc::new(table),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn baseline(&self) -> &Arc<ContinuationTable> {
        &self.baseline
    }

    /// Process every language in parallel. Results keep request order.
    /// Repeated codes are processed once, at their first position, so two
    /// workers never write the same output files.
    pub fn run(&self, langs: &[String]) -> BatchReport {
        let mut unique: Vec<&str> = Vec::with_capacity(langs.len());
        for lang in langs {
            if unique.contains(&lang.as_str()) {
                debug!(lang = lang.as_str(), "dropping repeated language");
            } else {
                unique.push(lang);
            }
        }
        let results = unique.par_iter().map(|lang| self.process(lang)).collect();
        BatchReport { results }
    }

    /// Locate, compute and write artifacts for one language.
    pub fn process(&self, lang: &str) -> LanguageResult {
        let _span = debug_span!("process", lang).entered();
        let outcome = if lang == self.config.baseline {
            info!(lang, "skipping baseline language");
            LanguageOutcome::Skipped
        } else {
            match corpus::load_language(&self.config.dict_dir, lang) {
                Ok(corpus) => self.build_and_save(lang, &corpus),
                Err(e) => {
                    warn!(lang, error = %e, "corpus unavailable");
                    LanguageOutcome::Failed(e.into())
                }
            }
        };
        LanguageResult {
            lang: lang.to_string(),
            outcome,
        }
    }

    /// Compute the boost map, trie and report for `target` in memory.
    pub fn build(&self, lang: &str, target: &FrequencyCorpus) -> LanguageArtifacts {
        let params = &self.config.boost;
        let table = ContinuationTable::from_corpus(target, params.max_prefix_len);
        let boosts = compute_boosts(&table, &self.baseline, params);
        let trie = BoostTrie::from_boosts(&boosts);
        let report = BoostReport::new(lang, &self.config.baseline, params, &boosts, &trie);
        LanguageArtifacts {
            boosts,
            trie,
            report,
        }
    }

    fn build_and_save(&self, lang: &str, target: &FrequencyCorpus) -> LanguageOutcome {
        let artifacts = self.build(lang, target);
        if let Err(e) = self.save(lang, &artifacts) {
            warn!(lang, error = %e, "failed to write artifacts");
            return LanguageOutcome::Failed(e);
        }
        if artifacts.boosts.is_empty() {
            warn!(lang, "no significant boosts");
            return LanguageOutcome::NoBoosts;
        }
        let outcome = LanguageOutcome::Built {
            prefixes: artifacts.boosts.len(),
            boosts: boost_count(&artifacts.boosts),
            node_count: artifacts.trie.node_count(),
            edge_count: artifacts.trie.edge_count(),
        };
        info!(lang, ?outcome, "built prefix boosts");
        outcome
    }

    fn save(&self, lang: &str, artifacts: &LanguageArtifacts) -> Result<(), PipelineError> {
        artifacts.trie.save(&self.config.binary_path(lang))?;
        artifacts.report.save(&self.config.report_path(lang))?;
        Ok(())
    }
}
