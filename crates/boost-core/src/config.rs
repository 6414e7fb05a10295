//! Build configuration loaded from TOML.
//!
//! - Default values are embedded via `include_str!("default_config.toml")`
//! - `BuildConfig::load(Some(path))` reads a custom file instead
//! - Every loaded configuration passes through [`validate`]

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::boost::BoostParams;

pub const DEFAULT_CONFIG_TOML: &str = include_str!("default_config.toml");

/// Prefix lengths above this are rejected; continuation tables grow with
/// every extra length and no language needs longer context.
pub const MAX_PREFIX_LIMIT: usize = 16;

/// Returns the embedded default configuration TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub baseline: String,
    #[serde(default)]
    pub languages: Vec<String>,
    pub dict_dir: PathBuf,
    pub output_dir: PathBuf,
    pub boost: BoostParams,
}

impl BuildConfig {
    /// Load from `path`, or the embedded defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => parse_config_toml(&fs::read_to_string(p)?),
            None => parse_config_toml(DEFAULT_CONFIG_TOML),
        }
    }

    /// Path of the compiled trie for `lang`.
    pub fn binary_path(&self, lang: &str) -> PathBuf {
        self.output_dir.join(format!("{lang}.bin"))
    }

    /// Path of the human-readable report for `lang`.
    pub fn report_path(&self, lang: &str) -> PathBuf {
        self.output_dir.join(format!("{lang}.json"))
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        parse_config_toml(DEFAULT_CONFIG_TOML).expect("default config TOML must be valid")
    }
}

pub fn parse_config_toml(toml_str: &str) -> Result<BuildConfig, ConfigError> {
    let config: BuildConfig =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn is_language_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

pub fn validate(config: &BuildConfig) -> Result<(), ConfigError> {
    if !is_language_code(&config.baseline) {
        return Err(invalid("baseline", "must be a lower-case language code"));
    }
    for lang in &config.languages {
        if !is_language_code(lang) {
            return Err(ConfigError::InvalidValue {
                field: "languages".to_string(),
                reason: format!("'{lang}' is not a lower-case language code"),
            });
        }
    }
    validate_params(&config.boost)
}

/// Parameter checks shared by file-loaded and CLI-overridden values.
pub fn validate_params(p: &BoostParams) -> Result<(), ConfigError> {
    if !(p.alpha > 0.0 && p.alpha.is_finite()) {
        return Err(invalid("boost.alpha", "must be a positive number"));
    }
    // A zero or negative threshold would admit boosts of 0.0, which the
    // automaton reserves for "no boost".
    if !(p.threshold > 0.0 && p.threshold.is_finite()) {
        return Err(invalid("boost.threshold", "must be a positive number"));
    }
    if p.min_prefix_len == 0 {
        return Err(invalid("boost.min_prefix_len", "must be at least 1"));
    }
    if p.min_prefix_len > p.max_prefix_len {
        return Err(invalid(
            "boost.min_prefix_len",
            "must not exceed boost.max_prefix_len",
        ));
    }
    if p.max_prefix_len > MAX_PREFIX_LIMIT {
        return Err(ConfigError::InvalidValue {
            field: "boost.max_prefix_len".to_string(),
            reason: format!("must be at most {MAX_PREFIX_LIMIT}"),
        });
    }
    Ok(())
}
