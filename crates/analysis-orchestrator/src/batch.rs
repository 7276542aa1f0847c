use super::AnalysisOrchestrator;
use analysis_core::{AnalysisReport, Verdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

impl AnalysisOrchestrator {
    /// Analyze every symbol with at most `batch_concurrency` in flight.
    /// Reports come back in input order.
    pub async fn analyze_batch(&self, symbols: &[String]) -> Vec<AnalysisReport> {
        let concurrency = self.config.batch_concurrency.max(1);
        tracing::info!("Starting batch of {} symbols (concurrency {})", symbols.len(), concurrency);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let task_symbol = symbol.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return AnalysisReport::data_error(&task_symbol, e.to_string()),
                };
                orchestrator.analyze(&task_symbol).await
            });
            handles.push((symbol.clone(), handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (symbol, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!("Task error for {}: {}", symbol, e);
                    reports.push(AnalysisReport::data_error(&symbol.trim().to_uppercase(), e.to_string()));
                }
            }
        }

        let summary = BatchSummary::from_reports(&reports);
        tracing::info!(
            "Batch complete: {} trusted, {} caution, {} risky, {} data errors",
            summary.trusted, summary.caution, summary.risky, summary.data_errors
        );
        reports
    }
}

/// Verdict counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub trusted: usize,
    pub caution: usize,
    pub risky: usize,
    pub data_errors: usize,
    /// Mean trust score over reports that are not DATA ERROR
    pub average_score: Option<f64>,
}

impl BatchSummary {
    pub fn from_reports(reports: &[AnalysisReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        let mut score_sum = 0.0;

        for report in reports {
            if report.is_data_error() {
                summary.data_errors += 1;
                continue;
            }
            score_sum += report.trust_score;
            match Verdict::from_score(report.trust_score) {
                Verdict::Trusted => summary.trusted += 1,
                Verdict::Caution => summary.caution += 1,
                Verdict::Risky => summary.risky += 1,
            }
        }

        let scored = summary.total - summary.data_errors;
        if scored > 0 {
            summary.average_score = Some((score_sum / scored as f64 * 10.0).round() / 10.0);
        }
        summary
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} analyzed: {} TRUSTED, {} CAUTION, {} RISKY, {} DATA ERROR",
            self.total, self.trusted, self.caution, self.risky, self.data_errors
        )?;
        if let Some(avg) = self.average_score {
            write!(f, " (average score {:.1})", avg)?;
        }
        Ok(())
    }
}
