pub mod build_ops;
pub mod config_ops;
pub mod inspect_ops;

use boost_core::automaton::FormatError;
use boost_core::config::ConfigError;
use boost_core::report::ReportError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("{0}")]
    Format(#[from] FormatError),
}
