use async_trait::async_trait;
use crate::{AnalysisError, Bar, FeatureVector, FinancialSnapshot, TrustReport};

/// Deterministic scoring of a snapshot against a rule set.
///
/// Implementations are pure and total: every finite snapshot yields a report.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, snapshot: &FinancialSnapshot) -> TrustReport;
}

/// Upstream market-data source. Implementations fill every missing field
/// with its safe default before returning a snapshot.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<FinancialSnapshot, AnalysisError>;

    /// Daily bars, oldest first
    async fn fetch_daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError>;
}

/// Opaque learned model: feature vector in, predicted return (%) out
#[async_trait]
pub trait ReturnPredictor: Send + Sync {
    async fn predict_return(&self, symbol: &str, features: &FeatureVector) -> Result<f64, AnalysisError>;
}

/// Free-text qualitative commentary on a scored snapshot
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn narrate(
        &self,
        symbol: &str,
        snapshot: &FinancialSnapshot,
        report: &TrustReport,
    ) -> Result<String, AnalysisError>;
}
