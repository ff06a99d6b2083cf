use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::persist::{load_snapshot, save_snapshot, IndexPaths};
use engine::score::DEFAULT_LIMIT;
use engine::{Engine, IdfMode, ScopeKind, TermScore};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    /// Corpus to index into; falls back to --scope when absent.
    scope: Option<String>,
    text: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect TF-IDF statistics snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index documents from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
        /// Default corpus for records without a scope field
        #[arg(long, default_value = "default")]
        scope: String,
        /// Use smoothed IDF = ln((N+1)/(DF+1)) + 1 instead of ln(N/DF)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
    /// Print ranked term statistics from a saved snapshot
    Stats {
        /// Snapshot directory
        #[arg(long)]
        index: String,
        /// Scope to report on
        #[arg(long)]
        scope: String,
        /// Report a single document instead of the scope aggregate
        #[arg(long)]
        doc: Option<String>,
        /// Maximum number of terms to print
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, scope, smoothed_idf } => {
            build(&input, &output, &scope, smoothed_idf)
        }
        Commands::Stats { index, scope, doc, limit } => stats(&index, &scope, doc, limit),
    }
}

fn build(input: &str, output: &str, default_scope: &str, smoothed_idf: bool) -> Result<()> {
    let input_path = Path::new(input);
    let mode = if smoothed_idf { IdfMode::Smoothed } else { IdfMode::Standard };
    let engine = Engine::new(mode);

    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path does not exist: {input}");
    }

    let mut scopes_seen: HashSet<String> = HashSet::new();
    let mut num_docs = 0u32;
    for file in files {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for doc in docs {
            let scope = doc.scope.unwrap_or_else(|| default_scope.to_string());
            if scopes_seen.insert(scope.clone()) {
                engine.create_scope(&scope, ScopeKind::Corpus);
            }
            let terms = engine.index_document(&scope, &doc.id, &doc.text)?;
            num_docs += 1;
            tracing::debug!(doc = %doc.id, %scope, terms, title = doc.title.as_deref(), "ingested");
        }
    }
    tracing::info!(num_docs, num_scopes = scopes_seen.len(), "ingested documents");

    let out_paths = IndexPaths::new(output);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    save_snapshot(&out_paths, &engine, created_at)?;
    tracing::info!(output, "snapshot saved");
    Ok(())
}

fn stats(index: &str, scope: &str, doc: Option<String>, limit: usize) -> Result<()> {
    let paths = IndexPaths::new(index);
    let engine = load_snapshot(&paths)
        .with_context(|| format!("failed to load snapshot from {index}"))?;

    let scope_id = scope.to_string();
    let scores = match &doc {
        Some(doc_id) => engine.document_scores(doc_id, Some(&scope_id), limit)?,
        None => engine.scope_scores(&scope_id, limit)?,
    };

    match &doc {
        Some(doc_id) => println!("document {doc_id} in scope {scope}:"),
        None => {
            let count = engine.document_count(&scope_id)?;
            println!("scope {scope} ({count} documents):");
        }
    }
    print_scores(&scores);
    Ok(())
}

fn print_scores(scores: &[TermScore]) {
    println!("{:<24} {:>9} {:>9} {:>9} {:>9}", "term", "freq", "tf", "idf", "tfidf");
    for s in scores {
        let r = s.rounded();
        println!(
            "{:<24} {:>9} {:>9.4} {:>9.4} {:>9.4}",
            r.term, r.frequency, r.tf, r.idf, r.tfidf
        );
    }
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let f = File::open(file).with_context(|| format!("open {}", file.display()))?;
    let reader = BufReader::new(f);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(serde_json::from_str(&line)?);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let f = File::open(file).with_context(|| format!("open {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<InputDoc>, _>>()?,
        obj @ serde_json::Value::Object(_) => vec![serde_json::from_value(obj)?],
        _ => Vec::new(),
    };
    Ok(docs)
}
