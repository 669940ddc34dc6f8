use anyhow::{bail, Context, Result};
use booksim_core::gutenberg::parse_transcript;
use booksim_core::persist::{load_index, save_index, IndexPaths};
use booksim_core::{
    build_index, CanonicalOrder, DocRecord, FeedbackQuery, PipelineConfig, RocchioWeights, VectorizerConfig,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect the book similarity index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Lexicographic,
    Numeric,
    FirstSeen,
}

impl From<Order> for CanonicalOrder {
    fn from(o: Order) -> Self {
        match o {
            Order::Lexicographic => CanonicalOrder::SuffixLexicographic,
            Order::Numeric => CanonicalOrder::SuffixNumeric,
            Order::FirstSeen => CanonicalOrder::FirstSeen,
        }
    }
}

/// Vocabulary bounds used when neither a flag nor the config file sets them.
const DEFAULT_MIN_DF: usize = 10;
const DEFAULT_MAX_DF: f64 = 0.8;
const DEFAULT_MAX_FEATURES: usize = 1800;

#[derive(Args)]
struct BuildArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// Output index directory
    #[arg(long)]
    output: String,
    /// JSON object mapping each title to its list of authors
    #[arg(long)]
    authors: Option<String>,
    /// JSON pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<String>,
    /// Minimum document frequency of a vocabulary term [default: 10]
    #[arg(long)]
    min_df: Option<usize>,
    /// Maximum fraction of documents a vocabulary term may appear in [default: 0.8]
    #[arg(long)]
    max_df: Option<f64>,
    /// Vocabulary size cap [default: 1800]
    #[arg(long, conflicts_with = "no_max_features")]
    max_features: Option<usize>,
    /// Keep every term that passes the document frequency bounds
    #[arg(long)]
    no_max_features: bool,
    /// How to choose between records that share a title
    #[arg(long, value_enum)]
    canonical_order: Option<Order>,
}

impl BuildArgs {
    /// Defaults, then the config file, then flags.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let base = PipelineConfig {
            vectorizer: VectorizerConfig {
                min_df: DEFAULT_MIN_DF,
                max_df: DEFAULT_MAX_DF,
                max_features: Some(DEFAULT_MAX_FEATURES),
            },
            ..Default::default()
        };
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file_over(path, &base)?,
            None => base,
        };
        if let Some(min_df) = self.min_df {
            config.vectorizer.min_df = min_df;
        }
        if let Some(max_df) = self.max_df {
            config.vectorizer.max_df = max_df;
        }
        if self.no_max_features {
            config.vectorizer.max_features = None;
        } else if let Some(cap) = self.max_features {
            config.vectorizer.max_features = Some(cap);
        }
        if let Some(order) = self.canonical_order {
            config.normalize.canonical_order = order.into();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL records or plain-text transcripts
    Build(BuildArgs),
    /// Print the most and least similar titles for one title
    Query {
        #[arg(long)]
        index: String,
        #[arg(long)]
        title: String,
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Mean average precision of Rocchio feedback over a JSON list of queries
    Evaluate {
        #[arg(long)]
        index: String,
        /// JSON array of {"title", "text"?, "relevant", "irrelevant"}
        #[arg(long)]
        queries: String,
        #[arg(long, default_value_t = 0.3)]
        alpha: f32,
        #[arg(long, default_value_t = 0.3)]
        beta: f32,
        #[arg(long, default_value_t = 0.8)]
        gamma: f32,
        /// Keep negative components of the adjusted query
        #[arg(long, default_value_t = false)]
        no_clip: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            let config = args.pipeline_config()?;
            build(&args.input, &args.output, args.authors.as_deref(), &config)
        }
        Commands::Query { index, title, k } => query(&index, &title, k),
        Commands::Evaluate { index, queries, alpha, beta, gamma, no_clip } => {
            evaluate(&index, &queries, RocchioWeights { alpha, beta, gamma }, !no_clip)
        }
    }
}

fn build(input: &str, output: &str, authors: Option<&str>, config: &PipelineConfig) -> Result<()> {
    let records = read_records(Path::new(input))?;
    tracing::info!(records = records.len(), input, "loaded records");

    let title_authors = authors.map(read_title_authors).transpose()?;
    let index = build_index(records, title_authors, config)?;

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths, &index)?;
    tracing::info!(output, "index written");
    Ok(())
}

fn query(index: &str, title: &str, k: usize) -> Result<()> {
    let index = load_index(&IndexPaths::new(index))?;
    let recs = index.recommend(title, k)?;
    println!("{}", serde_json::to_string_pretty(&recs)?);
    Ok(())
}

fn evaluate(index: &str, queries: &str, weights: RocchioWeights, clip: bool) -> Result<()> {
    let index = load_index(&IndexPaths::new(index))?;
    let raw = fs::read_to_string(queries).with_context(|| format!("reading {queries}"))?;
    let queries: Vec<FeedbackQuery> = serde_json::from_str(&raw)?;
    let map = index.evaluate_feedback(&queries, weights, clip)?;
    tracing::info!(queries = queries.len(), map, "evaluated feedback");
    println!("{map:.4}");
    Ok(())
}

/// Every record under `input` in path order, so rebuilds see the same indices.
fn read_records(input: &Path) -> Result<Vec<DocRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl" | "txt")) {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }

    let mut records = Vec::new();
    for file in files {
        match extension(&file) {
            Some("jsonl") => read_jsonl(&file, &mut records)?,
            Some("txt") => records.push(read_transcript(&file)?),
            _ => read_json(&file, &mut records)?,
        }
    }
    Ok(records)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, records: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: DocRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), n + 1))?;
        records.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                records.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => records.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping JSON that is neither object nor array"),
    }
    Ok(())
}

fn read_transcript(file: &Path) -> Result<DocRecord> {
    let id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no file stem for {}", file.display()))?;
    let raw = fs::read(file)?;
    Ok(parse_transcript(id, &String::from_utf8_lossy(&raw)))
}

fn read_title_authors(path: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    Ok(serde_json::from_str(&raw)?)
}
