//! trust-cli: score companies against the fundamental rule set.
//!
//! Usage:
//!   trust-cli analyze AAPL
//!   trust-cli analyze TSLA --json --no-llm
//!   trust-cli batch AAPL MSFT NVDA --output results.csv --concurrency 4
//!   trust-cli score --file snapshot.json

mod cli;
mod output;

use analysis_core::{AnalysisReport, FinancialSnapshot};
use analysis_orchestrator::{parse_thresholds, AnalysisOrchestrator, BatchSummary, OrchestratorConfig};
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, DEFAULT_SYMBOLS};
use ml_client::MLConfig;
use std::fs::File;
use std::path::Path;
use symbolic_engine::{FinancialRuleEngine, RuleThresholds};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trust_cli=info,analysis_orchestrator=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = OrchestratorConfig::from_env()?;

    match cli.command {
        Commands::Analyze { symbol, json, no_ml, no_llm } => {
            let config = OrchestratorConfig {
                enable_predictor: config.enable_predictor && !no_ml,
                enable_narrative: config.enable_narrative && !no_llm,
                ..config
            };
            let orchestrator = AnalysisOrchestrator::live(config, &MLConfig::from_env());
            let report = orchestrator.analyze(&symbol).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_report(&report));
            }
        }
        Commands::Batch { symbols, output: path, concurrency, full } => {
            let symbols: Vec<String> = if symbols.is_empty() {
                DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
            } else {
                symbols
            };
            let config = OrchestratorConfig {
                enable_predictor: full && config.enable_predictor,
                enable_narrative: full && config.enable_narrative,
                batch_concurrency: concurrency.unwrap_or(config.batch_concurrency).max(1),
                ..config
            };

            tracing::info!(
                "Batch analysis of {} symbols -> {} (concurrency {})",
                symbols.len(),
                path.display(),
                config.batch_concurrency
            );

            let orchestrator = AnalysisOrchestrator::live(config, &MLConfig::from_env());
            let reports = orchestrator.analyze_batch(&symbols).await;

            let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            output::write_csv(file, &reports)?;

            for report in &reports {
                println!("{:<8} {:>5.1}  {}", report.symbol, report.trust_score, report.verdict);
            }
            println!("{}", BatchSummary::from_reports(&reports));
            println!("Results saved to {}", path.display());
        }
        Commands::Score { file, thresholds, json } => {
            let thresholds = match thresholds {
                Some(path) => parse_thresholds(&read_file(&path)?)?,
                None => config.thresholds,
            };
            let snapshot: FinancialSnapshot = serde_json::from_str(&read_file(&file)?)
                .with_context(|| format!("parsing snapshot {}", file.display()))?;

            let report = score_offline(snapshot, thresholds);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_report(&report));
            }
        }
    }

    Ok(())
}

/// Rule evaluation only. No data provider or ML client is constructed.
fn score_offline(snapshot: FinancialSnapshot, thresholds: RuleThresholds) -> AnalysisReport {
    let snapshot = snapshot.sanitized();
    let trust = FinancialRuleEngine::with_thresholds(thresholds).evaluate(&snapshot);
    AnalysisReport::from_evaluation(snapshot, trust)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
