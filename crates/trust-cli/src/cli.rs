use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Symbols scored when `batch` is given none
pub const DEFAULT_SYMBOLS: &[&str] = &["TSLA", "AAPL", "NVDA", "AMZN", "MSFT", "GOOGL"];

#[derive(Parser)]
#[command(name = "trust-cli", about = "Rule-based trust scoring for listed companies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and score one symbol
    Analyze {
        symbol: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Skip the return predictor
        #[arg(long)]
        no_ml: bool,
        /// Skip the LLM narrative
        #[arg(long)]
        no_llm: bool,
    },
    /// Score many symbols and write a CSV
    Batch {
        /// Symbols to score (defaults to a small large-cap list)
        symbols: Vec<String>,
        #[arg(long, default_value = "results.csv")]
        output: PathBuf,
        /// Max symbols in flight (overrides TRUSTIQ_BATCH_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Also call the return predictor and LLM for every symbol
        #[arg(long)]
        full: bool,
    },
    /// Score a snapshot stored in a local JSON file, without network access
    Score {
        #[arg(long)]
        file: PathBuf,
        /// Optional JSON thresholds document
        #[arg(long)]
        thresholds: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}
