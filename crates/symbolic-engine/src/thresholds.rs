use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Cut-offs used by the rule set.
///
/// `max_debt_to_equity` is expressed in the provider's percentage-style unit,
/// the same unit as `FinancialSnapshot::debt_to_equity`: `200.0` means a 2.0x
/// ratio. Fractional thresholds (`min_revenue_growth`, `min_profit_margin`,
/// `min_roe`) compare against fractions, so `0.05` is 5%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// P/E ceiling for sectors that tolerate high multiples
    pub growth_sector_pe_limit: f64,
    /// P/E ceiling for every other sector, including unrecognized ones
    pub default_pe_limit: f64,
    pub growth_sectors: Vec<String>,
    pub max_debt_to_equity: f64,
    pub min_revenue_growth: f64,
    pub min_profit_margin: f64,
    pub min_roe: f64,
    pub min_free_cash_flow: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            growth_sector_pe_limit: 60.0,
            default_pe_limit: 30.0,
            growth_sectors: vec![
                "Technology".to_string(),
                "Communication Services".to_string(),
            ],
            max_debt_to_equity: 200.0,
            min_revenue_growth: 0.05,
            min_profit_margin: 0.10,
            min_roe: 0.15,
            min_free_cash_flow: 0.0,
        }
    }
}

impl RuleThresholds {
    /// P/E limit applicable to `sector`. Matching is exact; any other
    /// string, including a differently cased one, gets the default limit.
    pub fn pe_limit(&self, sector: &str) -> f64 {
        if self.growth_sectors.iter().any(|s| s == sector) {
            self.growth_sector_pe_limit
        } else {
            self.default_pe_limit
        }
    }

    /// Reject thresholds that would make a rule meaningless.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let values = [
            ("growth_sector_pe_limit", self.growth_sector_pe_limit),
            ("default_pe_limit", self.default_pe_limit),
            ("max_debt_to_equity", self.max_debt_to_equity),
            ("min_revenue_growth", self.min_revenue_growth),
            ("min_profit_margin", self.min_profit_margin),
            ("min_roe", self.min_roe),
            ("min_free_cash_flow", self.min_free_cash_flow),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::Config(format!("threshold {} is not finite", name)));
        }
        if self.growth_sector_pe_limit <= 0.0 || self.default_pe_limit <= 0.0 {
            return Err(AnalysisError::Config(
                "P/E limits must be positive".to_string(),
            ));
        }
        if self.max_debt_to_equity <= 0.0 {
            return Err(AnalysisError::Config(
                "max_debt_to_equity must be positive (percentage-style, 200 = 2.0x)".to_string(),
            ));
        }
        Ok(())
    }
}
