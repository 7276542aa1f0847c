use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol used when the upstream provider could not identify the company.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
/// Sector used when the provider has no classification.
pub const UNKNOWN_SECTOR: &str = "Unknown";
/// Verdict label of a report whose snapshot could not be assembled.
pub const DATA_ERROR_VERDICT: &str = "DATA ERROR";

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Point-in-time fundamentals for one company.
///
/// Every field carries a safe default so a partially populated record still
/// deserializes: numbers default to `0.0`, the sector to `"Unknown"` and the
/// symbol to `"UNKNOWN"`. Absent data is therefore modelled as a worst-case or
/// neutral value and never as an error.
///
/// Units follow the market-data provider:
/// - `debt_to_equity` is percentage-style (`150.0` means a 1.5x ratio)
/// - `revenue_growth`, `profit_margins`, `roe` and `dividend_yield` are fractions (`0.05` = 5%)
/// - cash amounts are in the reporting currency and may be negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialSnapshot {
    pub symbol: String,
    pub sector: String,
    pub current_price: f64,
    pub pe_ratio: f64,
    pub debt_to_equity: f64,
    pub revenue_growth: f64,
    pub cash_reserves: f64,
    pub operating_costs: f64,
    pub net_income: f64,
    pub profit_margins: f64,
    pub roe: f64,
    pub free_cash_flow: f64,
    /// Carried through to reports, not evaluated by any rule.
    pub dividend_yield: f64,
    /// Mean analyst price target. Carried through, not evaluated.
    pub analyst_target: f64,
}

impl Default for FinancialSnapshot {
    fn default() -> Self {
        Self {
            symbol: UNKNOWN_SYMBOL.to_string(),
            sector: UNKNOWN_SECTOR.to_string(),
            current_price: 0.0,
            pe_ratio: 0.0,
            debt_to_equity: 0.0,
            revenue_growth: 0.0,
            cash_reserves: 0.0,
            operating_costs: 0.0,
            net_income: 0.0,
            profit_margins: 0.0,
            roe: 0.0,
            free_cash_flow: 0.0,
            dividend_yield: 0.0,
            analyst_target: 0.0,
        }
    }
}

impl FinancialSnapshot {
    /// Empty snapshot for `symbol`, all metrics at their defaults.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
        .sanitized()
    }

    /// Normalise a record at the system boundary: blank identifiers take
    /// their sentinels, negative prices and non-finite numbers become `0.0`.
    pub fn sanitized(mut self) -> Self {
        fn finite_or_zero(v: f64) -> f64 {
            if v.is_finite() { v } else { 0.0 }
        }

        if self.symbol.trim().is_empty() {
            self.symbol = UNKNOWN_SYMBOL.to_string();
        } else {
            self.symbol = self.symbol.trim().to_uppercase();
        }
        if self.sector.trim().is_empty() {
            self.sector = UNKNOWN_SECTOR.to_string();
        }

        self.current_price = finite_or_zero(self.current_price).max(0.0);
        self.pe_ratio = finite_or_zero(self.pe_ratio);
        self.debt_to_equity = finite_or_zero(self.debt_to_equity);
        self.revenue_growth = finite_or_zero(self.revenue_growth);
        self.cash_reserves = finite_or_zero(self.cash_reserves);
        self.operating_costs = finite_or_zero(self.operating_costs);
        self.net_income = finite_or_zero(self.net_income);
        self.profit_margins = finite_or_zero(self.profit_margins);
        self.roe = finite_or_zero(self.roe);
        self.free_cash_flow = finite_or_zero(self.free_cash_flow);
        self.dividend_yield = finite_or_zero(self.dividend_yield);
        self.analyst_target = finite_or_zero(self.analyst_target);
        self
    }

    /// A zero price means the provider returned nothing usable.
    pub fn has_price(&self) -> bool {
        self.current_price > 0.0
    }
}

/// Outcome of a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleStatus {
    Pass,
    Fail,
}

impl RuleStatus {
    pub fn from_bool(passed: bool) -> Self {
        if passed { RuleStatus::Pass } else { RuleStatus::Fail }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Pass => "PASS",
            RuleStatus::Fail => "FAIL",
        }
    }
}

/// One line of the audit breakdown: which rule, whether it passed, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub status: RuleStatus,
    pub detail: String,
}

impl RuleOutcome {
    pub fn passed(&self) -> bool {
        self.status == RuleStatus::Pass
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.status.as_str(), self.rule, self.detail)
    }
}

/// Three-tier label derived from the trust score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Trusted,
    Caution,
    Risky,
}

impl Verdict {
    /// Inclusive lower bound of the TRUSTED band
    pub const TRUSTED_MIN: f64 = 70.0;
    /// Inclusive lower bound of the CAUTION band
    pub const CAUTION_MIN: f64 = 40.0;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::TRUSTED_MIN {
            Verdict::Trusted
        } else if score >= Self::CAUTION_MIN {
            Verdict::Caution
        } else {
            Verdict::Risky
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Trusted => "TRUSTED",
            Verdict::Caution => "CAUTION",
            Verdict::Risky => "RISKY",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one snapshot against the rule set.
///
/// `breakdown` is in rule evaluation order. `total` is the size of the rule
/// set that produced this report; consumers should read it rather than assume
/// a fixed rule count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustReport {
    pub score: f64, // 0.0 to 100.0, one decimal
    pub verdict: Verdict,
    pub passed: usize,
    pub total: usize,
    pub breakdown: Vec<RuleOutcome>,
}

impl TrustReport {
    /// Rules that failed, in evaluation order
    pub fn violations(&self) -> Vec<RuleOutcome> {
        self.breakdown.iter().filter(|r| !r.passed()).cloned().collect()
    }

    pub fn outcome(&self, rule: &str) -> Option<&RuleOutcome> {
        self.breakdown.iter().find(|r| r.rule == rule)
    }
}

/// Technical indicators computed from daily bars, used as predictor input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalFeatures {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub roc: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub ema_20: f64,
    pub price_vs_sma50: f64,
    pub price_vs_sma200: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub bb_position: f64,
    pub atr: f64,
    pub volatility: f64,
    pub volume_trend: f64,
    pub volume_ratio: f64,
    pub trend_strength: f64,
}

impl Default for TechnicalFeatures {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            roc: 0.0,
            sma_50: 0.0,
            sma_200: 0.0,
            ema_20: 0.0,
            price_vs_sma50: 0.0,
            price_vs_sma200: 0.0,
            bb_upper: 0.0,
            bb_lower: 0.0,
            bb_position: 0.5,
            atr: 0.0,
            volatility: 0.0,
            volume_trend: 0.0,
            volume_ratio: 1.0,
            trend_strength: 0.0,
        }
    }
}

/// Named, ordered feature values sent to the return predictor.
/// Order is part of the model contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: f64) {
        self.names.push(name.to_string());
        self.values.push(if value.is_finite() { value } else { 0.0 });
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Final payload combining the rule result with optional predictor and
/// narrative output. This is what the CLI prints and the batch writer exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub trust_score: f64,
    /// TRUSTED, CAUTION, RISKY or DATA ERROR
    pub verdict: String,
    pub price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub metrics: Option<FinancialSnapshot>,
    pub breakdown: Vec<RuleOutcome>,
    pub rule_violations: Vec<RuleOutcome>,
    #[serde(default)]
    pub predicted_return: Option<f64>,
    #[serde(default)]
    pub llm_reasoning: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisReport {
    /// Report for a symbol whose data could not be fetched: score 0, DATA ERROR.
    pub fn data_error(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            trust_score: 0.0,
            verdict: DATA_ERROR_VERDICT.to_string(),
            price: None,
            pe_ratio: None,
            metrics: None,
            breakdown: Vec::new(),
            rule_violations: Vec::new(),
            predicted_return: None,
            llm_reasoning: None,
            error: Some(message.into()),
        }
    }

    pub fn from_evaluation(snapshot: FinancialSnapshot, trust: TrustReport) -> Self {
        let rule_violations = trust.violations();
        Self {
            symbol: snapshot.symbol.clone(),
            timestamp: Utc::now(),
            trust_score: trust.score,
            verdict: trust.verdict.as_str().to_string(),
            price: Some(snapshot.current_price),
            pe_ratio: Some(snapshot.pe_ratio),
            metrics: Some(snapshot),
            breakdown: trust.breakdown,
            rule_violations,
            predicted_return: None,
            llm_reasoning: None,
            error: None,
        }
    }

    pub fn is_data_error(&self) -> bool {
        self.verdict == DATA_ERROR_VERDICT
    }
}
