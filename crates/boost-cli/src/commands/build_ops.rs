use std::path::PathBuf;
use std::process;
use std::time::Instant;

use boost_core::config::{self, BuildConfig};
use boost_core::pipeline::{BatchReport, LanguageOutcome, LanguageResult, Orchestrator};
use tracing::debug;

use super::CliError;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Command-line overrides; `None` keeps the configured value.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    pub config: Option<PathBuf>,
    pub langs: Option<String>,
    pub baseline: Option<String>,
    pub dict_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub alpha: Option<f64>,
    pub top_k: Option<usize>,
    pub min_count: Option<u64>,
    pub min_prefix: Option<usize>,
    pub max_prefix: Option<usize>,
}

/// Load the config file (or defaults), apply overrides and re-validate.
pub fn resolve_config(opts: &BuildOptions) -> Result<BuildConfig, CliError> {
    let mut c = BuildConfig::load(opts.config.as_deref())?;
    if let Some(v) = &opts.baseline {
        c.baseline = v.clone();
    }
    if let Some(v) = &opts.dict_dir {
        c.dict_dir = v.clone();
    }
    if let Some(v) = &opts.output_dir {
        c.output_dir = v.clone();
    }
    if let Some(v) = opts.threshold {
        c.boost.threshold = v;
    }
    if let Some(v) = opts.alpha {
        c.boost.alpha = v;
    }
    if let Some(v) = opts.top_k {
        c.boost.top_k = v;
    }
    if let Some(v) = opts.min_count {
        c.boost.min_target_count = v;
    }
    if let Some(v) = opts.min_prefix {
        c.boost.min_prefix_len = v;
    }
    if let Some(v) = opts.max_prefix {
        c.boost.max_prefix_len = v;
    }
    if let Some(langs) = &opts.langs {
        c.languages = parse_langs(langs);
    }
    config::validate(&c)?;
    Ok(c)
}

/// Split a comma-separated language list, dropping blanks and duplicates.
pub fn parse_langs(list: &str) -> Vec<String> {
    let mut langs: Vec<String> = Vec::new();
    for code in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        if !code.is_empty() && !langs.contains(&code) {
            langs.push(code);
        }
    }
    langs
}

pub fn describe(result: &LanguageResult) -> String {
    let lang = &result.lang;
    match &result.outcome {
        LanguageOutcome::Built {
            prefixes,
            boosts,
            node_count,
            edge_count,
        } => format!(
            "{lang}: {prefixes} prefixes, {boosts} boosts, {node_count} nodes, {edge_count} edges"
        ),
        LanguageOutcome::NoBoosts => format!("{lang}: no significant boosts (root-only trie)"),
        LanguageOutcome::Skipped => format!("{lang}: skipped (baseline)"),
        LanguageOutcome::Failed(e) => format!("{lang}: FAILED: {e}"),
    }
}

/// 1 when nothing was built, else 0.
pub fn exit_status(batch: &BatchReport) -> i32 {
    if batch.built_count() == 0 {
        1
    } else {
        0
    }
}

pub fn build(opts: &BuildOptions) {
    let config = die!(resolve_config(opts), "Error: {}");
    debug!(?config, "resolved build config");
    if config.languages.is_empty() {
        eprintln!("Error: no languages requested");
        process::exit(1);
    }

    eprintln!(
        "Baseline: {} (from {})",
        config.baseline,
        config.dict_dir.display()
    );
    let start = Instant::now();
    let langs = config.languages.clone();
    let orchestrator = die!(
        Orchestrator::load_baseline(config),
        "Error loading baseline: {}"
    );
    eprintln!(
        "Baseline table: {} prefixes ({:.1}s)",
        orchestrator.baseline().len(),
        start.elapsed().as_secs_f64()
    );

    let batch = orchestrator.run(&langs);
    for result in &batch.results {
        println!("{}", describe(result));
    }
    println!(
        "Built {}/{} languages",
        batch.built_count(),
        batch.attempted_count()
    );
    eprintln!(
        "Output: {} ({:.1}s)",
        orchestrator.config().output_dir.display(),
        start.elapsed().as_secs_f64()
    );

    let status = exit_status(&batch);
    if status != 0 {
        process::exit(status);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use boost_core::pipeline::PipelineError;

    use super::*;

    #[test]
    fn test_parse_langs() {
        assert_eq!(parse_langs("fr, DE,,fr ,es"), vec!["fr", "de", "es"]);
        assert!(parse_langs(" , ").is_empty());
    }

    #[test]
    fn test_overrides_applied() {
        let opts = BuildOptions {
            langs: Some("fr,de".to_string()),
            threshold: Some(2.0),
            alpha: Some(0.5),
            top_k: Some(0),
            output_dir: Some(PathBuf::from("/tmp/boosts")),
            ..BuildOptions::default()
        };
        let c = resolve_config(&opts).unwrap();
        assert_eq!(c.languages, vec!["fr", "de"]);
        assert_eq!(c.boost.threshold, 2.0);
        assert_eq!(c.boost.alpha, 0.5);
        assert_eq!(c.boost.top_k, 0);
        assert_eq!(c.boost.min_target_count, 10);
        assert_eq!(c.output_dir, PathBuf::from("/tmp/boosts"));
        assert_eq!(c.baseline, "en");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let opts = BuildOptions {
            min_prefix: Some(5),
            max_prefix: Some(3),
            ..BuildOptions::default()
        };
        assert!(matches!(resolve_config(&opts), Err(CliError::Config(_))));
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boost.toml");
        let toml = boost_core::config::default_toml().replace("threshold = 1.5", "threshold = 3.0");
        fs::write(&path, toml).unwrap();

        let from_file = resolve_config(&BuildOptions {
            config: Some(path.clone()),
            ..BuildOptions::default()
        })
        .unwrap();
        assert_eq!(from_file.boost.threshold, 3.0);

        let overridden = resolve_config(&BuildOptions {
            config: Some(path),
            threshold: Some(1.0),
            ..BuildOptions::default()
        })
        .unwrap();
        assert_eq!(overridden.boost.threshold, 1.0);
    }

    #[test]
    fn test_describe_and_exit_status() {
        let batch = BatchReport {
            results: vec![
                LanguageResult {
                    lang: "es".to_string(),
                    outcome: LanguageOutcome::NoBoosts,
                },
                LanguageResult {
                    lang: "en".to_string(),
                    outcome: LanguageOutcome::Skipped,
                },
            ],
        };
        assert_eq!(describe(&batch.results[1]), "en: skipped (baseline)");
        assert_eq!(exit_status(&batch), 1);

        let built = LanguageResult {
            lang: "fr".to_string(),
            outcome: LanguageOutcome::Built {
                prefixes: 2,
                boosts: 3,
                node_count: 7,
                edge_count: 6,
            },
        };
        assert_eq!(
            describe(&built),
            "fr: 2 prefixes, 3 boosts, 7 nodes, 6 edges"
        );
        let failed = LanguageResult {
            lang: "de".to_string(),
            outcome: LanguageOutcome::Failed(PipelineError::Config(
                boost_core::config::ConfigError::Parse("x".to_string()),
            )),
        };
        assert!(describe(&failed).starts_with("de: FAILED"));

        let mut batch = batch;
        batch.results.push(built);
        assert_eq!(exit_status(&batch), 0);
    }
}
