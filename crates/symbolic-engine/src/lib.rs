//! Deterministic rule-based trust scoring over a company's fundamentals.
//!
//! The engine applies a fixed, ordered rule set to a `FinancialSnapshot`,
//! counts passes, and converts the pass ratio into a 0-100 score and a
//! TRUSTED / CAUTION / RISKY verdict. It holds no state between calls, does
//! no I/O and never fails: a missing or unusable metric turns into a FAIL for
//! the rule that reads it.

use analysis_core::{FinancialSnapshot, RuleEvaluator, TrustReport, Verdict};
use rayon::prelude::*;

pub mod rules;
pub mod thresholds;

#[cfg(test)]
mod engine_tests;

pub use rules::{Rule, RULES, RULE_NAMES};
pub use thresholds::RuleThresholds;

pub struct FinancialRuleEngine {
    thresholds: RuleThresholds,
}

impl FinancialRuleEngine {
    pub fn new() -> Self {
        Self::with_thresholds(RuleThresholds::default())
    }

    pub fn with_thresholds(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Score one snapshot. Every rule runs unconditionally, in `RULES` order.
    pub fn evaluate(&self, snapshot: &FinancialSnapshot) -> TrustReport {
        let breakdown: Vec<_> = RULES
            .iter()
            .map(|rule| rule(snapshot, &self.thresholds))
            .collect();

        let total = breakdown.len();
        let passed = breakdown.iter().filter(|r| r.passed()).count();
        let score = score_from_counts(passed, total);
        let verdict = Verdict::from_score(score);

        tracing::debug!(
            "{}: {}/{} rules passed, score {:.1} ({})",
            snapshot.symbol, passed, total, score, verdict
        );

        TrustReport {
            score,
            verdict,
            passed,
            total,
            breakdown,
        }
    }

    /// Score many snapshots in parallel. Output order matches input order.
    pub fn evaluate_many(&self, snapshots: &[FinancialSnapshot]) -> Vec<TrustReport> {
        snapshots.par_iter().map(|s| self.evaluate(s)).collect()
    }
}

/// `100 * passed / total`, rounded to one decimal. An empty rule set scores 0.
pub fn score_from_counts(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = passed as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

impl RuleEvaluator for FinancialRuleEngine {
    fn evaluate(&self, snapshot: &FinancialSnapshot) -> TrustReport {
        FinancialRuleEngine::evaluate(self, snapshot)
    }
}

impl Default for FinancialRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
