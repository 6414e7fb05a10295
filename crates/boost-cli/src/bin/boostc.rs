use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boost_cli::commands::build_ops::{self, BuildOptions};
use boost_cli::commands::{config_ops, inspect_ops};

#[derive(Parser)]
#[command(name = "boostc", about = "Prefix boost table compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute boosts and compile tries for target languages
    Build {
        /// Comma-separated target languages (default: languages from config)
        #[arg(long)]
        langs: Option<String>,
        /// Significance threshold (natural-log odds)
        #[arg(long)]
        threshold: Option<f64>,
        /// Smoothing constant
        #[arg(long)]
        alpha: Option<f64>,
        /// Build configuration TOML (default: embedded)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory holding {lang}_enhanced.bin / .json corpora
        #[arg(long)]
        dict_dir: Option<PathBuf>,
        /// Output directory for {lang}.bin and {lang}.json
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Baseline language code
        #[arg(long)]
        baseline: Option<String>,
        /// Boosts kept per prefix (0 keeps all)
        #[arg(long)]
        top_k: Option<usize>,
        /// Minimum weighted target count
        #[arg(long)]
        min_count: Option<u64>,
        /// Shortest prefix considered
        #[arg(long)]
        min_prefix: Option<usize>,
        /// Longest prefix considered
        #[arg(long)]
        max_prefix: Option<usize>,
    },
    /// Compile a JSON boost report into a binary trie
    Compile {
        /// Report file ({lang}.json)
        report_file: String,
        /// Output binary file
        output_file: String,
    },
    /// Show trie, report or corpus info (auto-detected by magic bytes)
    Info {
        /// Trie (.bin), report (.json) or corpus file
        file: String,
    },
    /// Trace a word through a compiled trie
    Walk {
        /// Trie file
        trie_file: String,
        /// Word to trace (normalized before lookup)
        word: String,
    },
    /// Export default build configuration as TOML
    ConfigExport,
    /// Validate a custom build configuration TOML file
    ConfigValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("boost_core=info,boost_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            langs,
            threshold,
            alpha,
            config,
            dict_dir,
            output_dir,
            baseline,
            top_k,
            min_count,
            min_prefix,
            max_prefix,
        } => build_ops::build(&BuildOptions {
            config,
            langs,
            baseline,
            dict_dir,
            output_dir,
            threshold,
            alpha,
            top_k,
            min_count,
            min_prefix,
            max_prefix,
        }),
        Command::Compile {
            report_file,
            output_file,
        } => inspect_ops::compile(&report_file, &output_file),
        Command::Info { file } => inspect_ops::info(&file),
        Command::Walk { trie_file, word } => inspect_ops::walk(&trie_file, &word),
        Command::ConfigExport => config_ops::config_export(),
        Command::ConfigValidate { file } => config_ops::config_validate(&file),
    }
}
