use std::fs;
use std::path::Path;
use std::process;

use boost_core::automaton::{BoostTrie, CompiledTrie, WalkStep, MAGIC};
use boost_core::corpus::{self, BINARY_MAGIC};
use boost_core::report::BoostReport;
use boost_core::unicode::normalize;

use super::CliError;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Compile the boost map of a JSON report into a binary trie at `output`.
pub fn compile_report(report_file: &Path, output: &Path) -> Result<BoostTrie, CliError> {
    let report = BoostReport::load(report_file)?;
    let trie = BoostTrie::from_boosts(&report.boost_map()?);
    trie.save(output)?;
    Ok(trie)
}

pub fn compile(report_file: &str, output_file: &str) {
    eprintln!("Reading {report_file}...");
    let trie = die!(
        compile_report(Path::new(report_file), Path::new(output_file)),
        "Error compiling report: {}"
    );
    let file_size = fs::metadata(output_file).map(|m| m.len()).unwrap_or(0);
    eprintln!(
        "Wrote {output_file} ({} nodes, {} edges, {:.1} KB)",
        trie.node_count(),
        trie.edge_count(),
        file_size as f64 / 1024.0
    );
}

pub fn info(file: &str) {
    let head = fs::read(file)
        .ok()
        .and_then(|b| b.get(..4).map(|s| s.to_vec()));

    match head.as_deref() {
        Some(m) if m == MAGIC => info_trie(file),
        Some(m) if m == BINARY_MAGIC => info_corpus(file),
        Some(m) if m.first() == Some(&b'{') => info_json(file),
        Some(other) => {
            eprintln!(
                "Unknown file format (magic: {:?})",
                String::from_utf8_lossy(other)
            );
            process::exit(1);
        }
        None => {
            eprintln!("Error reading file: {file}");
            process::exit(1);
        }
    }
}

fn info_trie(file: &str) {
    let trie = die!(
        CompiledTrie::open(Path::new(file)),
        "Error opening trie: {}"
    );
    let file_size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    let stats = trie.stats();

    println!("Prefix boost trie: {file}");
    println!("File size:     {:.1} KB", file_size as f64 / 1024.0);
    println!("Nodes:         {}", stats.node_count);
    println!("Edges:         {}", stats.edge_count);
    println!("Boosted nodes: {}", stats.boosted_nodes);
    println!("Max boost:     {:.4}", stats.max_boost);
    println!("Mean boost:    {:.4}", stats.mean_boost);

    let root: Vec<String> = trie.edges(0).iter().map(|(c, _)| c.to_string()).collect();
    println!("Root edges:    {}", root.join(" "));
}

fn info_corpus(file: &str) {
    let corpus = die!(corpus::load(Path::new(file)), "Error reading corpus: {}");
    println!("Corpus: {file}");
    println!("Words:  {}", corpus.len());

    let mut top: Vec<(&str, u32)> = corpus.iter().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    println!();
    println!("Most frequent:");
    for (word, freq) in top.iter().take(10) {
        println!("  {word} ({freq})");
    }
}

/// A `{` file is either a boost report or a JSON corpus.
fn info_json(file: &str) {
    if let Ok(report) = BoostReport::load(Path::new(file)) {
        let p = &report.parameters;
        println!(
            "Boost report: {file} ({} vs {})",
            report.target_language, report.source_language
        );
        println!(
            "Parameters:   alpha={} threshold={} min_target_count={} prefix_len={}..={} top_k={}",
            p.alpha, p.threshold, p.min_target_count, p.min_prefix_len, p.max_prefix_len, p.top_k
        );
        println!("Prefixes:     {}", report.stats.prefix_count);
        println!("Boosts:       {}", report.stats.boost_count);
        println!("Nodes:        {}", report.stats.node_count);
        println!("Edges:        {}", report.stats.edge_count);
    } else {
        info_corpus(file);
    }
}

/// Normalize `word` and trace it through the automaton.
pub fn walk_trace(trie: &CompiledTrie, word: &str) -> (String, Vec<WalkStep>) {
    let normalized = normalize(word);
    let steps = trie.walk(&normalized);
    (normalized, steps)
}

pub fn walk(file: &str, word: &str) {
    let trie = die!(
        CompiledTrie::open(Path::new(file)),
        "Error opening trie: {}"
    );
    let (normalized, steps) = walk_trace(&trie, word);
    if normalized != word {
        println!("Normalized: {word} → {normalized}");
    }
    let mut total = 0f32;
    for step in &steps {
        total += step.boost;
        println!(
            "  {}  state={:<6} boost={:.4}",
            step.letter, step.state, step.boost
        );
    }
    println!("Total boost: {total:.4}");
}
