use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sift_core::persist::{load_index, save_index, IndexPaths, MetaFile};
use sift_core::{
    build_index, DocumentCatalog, FileDocument, IndexConfig, QuerySyntaxError, ScoringMode, SearchConfig, SearchOutcome,
    Searcher, StopWords,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build a boolean TF-IDF index over a directory of text files and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file under a directory
    Build {
        /// Corpus directory (or a single file)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Longest term kept; longer tokens are dropped
        #[arg(long, default_value_t = 15)]
        max_word_length: usize,
        /// File with one stop word per line
        #[arg(long, conflicts_with = "english_stopwords")]
        stopwords: Option<PathBuf>,
        /// Use the built-in English stop-word list
        #[arg(long, default_value_t = false)]
        english_stopwords: bool,
        /// Indexing worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Run boolean queries against a saved index
    Query {
        /// Index directory written by `build`
        #[arg(long)]
        index: PathBuf,
        /// File with one query per line; blank lines are skipped
        #[arg(long, required_unless_present = "query")]
        queries: Option<PathBuf>,
        /// Query given inline; may be repeated
        #[arg(long, short = 'q')]
        query: Vec<String>,
        /// Number of ranked results per query
        #[arg(short = 'k', long, default_value_t = 10)]
        limit: usize,
        /// Which document frequency feeds the score
        #[arg(long, value_enum, default_value_t = Scoring::Restricted)]
        scoring: Scoring,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scoring {
    Restricted,
    CorpusWide,
}

impl From<Scoring> for ScoringMode {
    fn from(s: Scoring) -> Self {
        match s {
            Scoring::Restricted => ScoringMode::Restricted,
            Scoring::CorpusWide => ScoringMode::CorpusWide,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_word_length, stopwords, english_stopwords, workers } => {
            let stopwords = match stopwords {
                Some(path) => StopWords::from_file(&path).with_context(|| format!("reading stop words from {}", path.display()))?,
                None if english_stopwords => StopWords::english(),
                None => StopWords::none(),
            };
            let defaults = IndexConfig::default();
            let config = IndexConfig { max_word_length, stopwords, workers: workers.unwrap_or(defaults.workers) };
            build(&input, &output, &config)
        }
        Commands::Query { index, queries, query, limit, scoring } => {
            let mut lines = query;
            if let Some(path) = queries {
                let text = fs::read_to_string(&path).with_context(|| format!("reading queries from {}", path.display()))?;
                lines.extend(text.lines().map(str::to_string));
            }
            run_queries(&index, &lines, SearchConfig { limit, scoring: scoring.into() })
        }
    }
}

/// Every regular file under `input`, in sorted order so document ids are reproducible.
fn collect_documents(input: &Path) -> Result<Vec<FileDocument>> {
    if input.is_file() {
        return Ok(vec![FileDocument::new(input)]);
    }
    if !input.is_dir() {
        bail!("corpus path {} does not exist", input.display());
    }
    let mut docs = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", input.display()))?;
        if entry.file_type().is_file() {
            docs.push(FileDocument::new(entry.path()));
        }
    }
    Ok(docs)
}

fn build(input: &Path, output: &Path, config: &IndexConfig) -> Result<()> {
    let docs = collect_documents(input)?;
    tracing::info!(files = docs.len(), workers = config.workers, "indexing corpus");
    let (index, report) = build_index(&docs, config)?;

    let paths = IndexPaths::new(output);
    let meta = MetaFile::describe(&index, config);
    save_index(&paths, &index, &meta)?;

    println!("Indexed {} documents ({} skipped), {} terms", report.processed, report.skipped.len(), meta.num_terms);
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.id, skipped.reason);
    }
    Ok(())
}

fn run_queries(index_dir: &Path, lines: &[String], config: SearchConfig) -> Result<()> {
    let (index, meta) = load_index(&IndexPaths::new(index_dir))
        .with_context(|| format!("loading index from {}", index_dir.display()))?;
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, "index loaded");
    let searcher = Searcher::new(Arc::new(index), config);

    for query in lines.iter().map(|l| l.trim()).filter(|q| !q.is_empty()) {
        let started = Instant::now();
        let result = searcher.search(query);
        print!("{}", render_report(query, &result, started.elapsed(), &searcher.index().catalog));
    }
    Ok(())
}

fn render_report(
    query: &str,
    result: &Result<SearchOutcome, QuerySyntaxError>,
    elapsed: Duration,
    catalog: &DocumentCatalog,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "-----------------");
    let _ = writeln!(out, "Search Query: {query}");
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            let _ = writeln!(out, "Invalid search string: {err}");
            return out;
        }
    };
    let _ = writeln!(out, "Search Query Logic: {}", outcome.logic);
    let _ = writeln!(out, "Search Terms: {}", outcome.terms.join(", "));
    if outcome.total_hits == 0 {
        let _ = writeln!(out, "Search Result: no matches");
    } else {
        let _ = writeln!(out, "Search Result: Found {} documents", outcome.total_hits);
        for hit in &outcome.hits {
            let name = catalog.external_id(hit.doc_id).unwrap_or("?");
            let _ = writeln!(out, "{name}\t{}", hit.score);
        }
    }
    let _ = writeln!(out, "Searched in: {:.6} [sec]", elapsed.as_secs_f64());
    out
}
