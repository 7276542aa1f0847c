use analysis_core::{
    AnalysisReport, FinancialSnapshot, NarrativeProvider, ReturnPredictor, RuleEvaluator,
    SnapshotProvider, TrustReport,
};
use market_data::YahooFinanceClient;
use ml_client::MLConfig;
use std::sync::Arc;
use symbolic_engine::FinancialRuleEngine;
use technical_analysis::{build_feature_vector, compute_features};

pub mod batch;
pub mod config;


pub use batch::BatchSummary;
pub use config::{parse_thresholds, OrchestratorConfig};

/// Fetch, score, and optionally predict and narrate for one symbol at a time.
///
/// All collaborators sit behind `Arc<dyn Trait>`, so the orchestrator is cheap
/// to clone into spawned batch tasks.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    provider: Arc<dyn SnapshotProvider>,
    evaluator: Arc<dyn RuleEvaluator>,
    predictor: Option<Arc<dyn ReturnPredictor>>,
    narrator: Option<Arc<dyn NarrativeProvider>>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    /// Orchestrator with the rule engine built from `config.thresholds` and no
    /// predictor or narrator attached.
    pub fn new(provider: Arc<dyn SnapshotProvider>, config: OrchestratorConfig) -> Self {
        let engine = FinancialRuleEngine::with_thresholds(config.thresholds.clone());
        Self {
            provider,
            evaluator: Arc::new(engine),
            predictor: None,
            narrator: None,
            config,
        }
    }

    /// Wire up Yahoo Finance and the ML/LLM clients according to `config`.
    pub fn live(config: OrchestratorConfig, ml: &MLConfig) -> Self {
        let mut orchestrator = Self::new(Arc::new(YahooFinanceClient::new()), config);

        if orchestrator.config.enable_predictor {
            tracing::info!("Return predictor enabled at {}", ml.predictor_url);
            orchestrator = orchestrator.with_predictor(Arc::new(ml.predictor()));
        }

        if orchestrator.config.enable_narrative {
            if !ml.llm_api_keys.is_empty() {
                tracing::info!(
                    "Narrative enabled ({} via {}, {} key(s))",
                    ml.llm_model, ml.llm_base_url, ml.llm_api_keys.len()
                );
                orchestrator = orchestrator.with_narrator(Arc::new(ml.narrator()));
            } else {
                tracing::warn!("GROQ_API_KEY not set, LLM narrative disabled");
            }
        }

        orchestrator
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn ReturnPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeProvider>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Full analysis for one symbol. Never fails: an unusable snapshot yields a
    /// DATA ERROR report, and collaborator failures only drop their own field.
    pub async fn analyze(&self, symbol: &str) -> AnalysisReport {
        let symbol = symbol.trim().to_uppercase();
        tracing::info!("Analyzing {}", symbol);

        let snapshot = match self.provider.fetch_snapshot(&symbol).await {
            Ok(snapshot) => snapshot.sanitized(),
            Err(e) => {
                tracing::warn!("Failed to fetch data for {}: {}", symbol, e);
                return AnalysisReport::data_error(&symbol, format!("Failed to fetch data: {}", e));
            }
        };

        if !snapshot.has_price() {
            tracing::warn!("No price data for {}", symbol);
            return AnalysisReport::data_error(&symbol, "No price data available");
        }

        let trust = self.evaluator.evaluate(&snapshot);
        tracing::info!(
            "{} scored {:.1} ({}), {}/{} rules passed",
            symbol, trust.score, trust.verdict, trust.passed, trust.total
        );

        let (predicted_return, llm_reasoning) = tokio::join!(
            self.predict(&symbol, &snapshot, trust.score),
            self.narrate(&symbol, &snapshot, &trust),
        );

        let mut report = AnalysisReport::from_evaluation(snapshot, trust);
        report.symbol = symbol;
        report.predicted_return = predicted_return;
        report.llm_reasoning = llm_reasoning;
        report
    }

    async fn predict(&self, symbol: &str, snapshot: &FinancialSnapshot, trust_score: f64) -> Option<f64> {
        let predictor = self.predictor.as_ref()?;

        let bars = match self
            .provider
            .fetch_daily_bars(symbol, self.config.history_days)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!("Price history unavailable for {}, using neutral technicals: {}", symbol, e);
                Vec::new()
            }
        };

        let technicals = compute_features(&bars);
        let features = build_feature_vector(snapshot, trust_score, &technicals);

        match predictor.predict_return(symbol, &features).await {
            Ok(predicted) => {
                tracing::info!("{} predicted return {:.2}%", symbol, predicted);
                Some(predicted)
            }
            Err(e) => {
                tracing::warn!("Return prediction failed for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn narrate(&self, symbol: &str, snapshot: &FinancialSnapshot, trust: &TrustReport) -> Option<String> {
        let narrator = self.narrator.as_ref()?;

        match narrator.narrate(symbol, snapshot, trust).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Narrative failed for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Score a locally supplied snapshot without touching any collaborator.
    pub fn score_snapshot(&self, snapshot: FinancialSnapshot) -> AnalysisReport {
        let snapshot = snapshot.sanitized();
        let trust = self.evaluator.evaluate(&snapshot);
        AnalysisReport::from_evaluation(snapshot, trust)
    }
}
