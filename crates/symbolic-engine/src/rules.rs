//! The individual rule predicates. Each one reads a few snapshot fields and
//! returns a `RuleOutcome`; none depends on another.

use analysis_core::{FinancialSnapshot, RuleOutcome, RuleStatus};
use crate::RuleThresholds;

pub const VALUATION: &str = "Valuation";
pub const SOLVENCY: &str = "Solvency";
pub const GROWTH: &str = "Growth";
pub const PROFITABILITY: &str = "Profitability";
pub const EFFICIENCY: &str = "Efficiency";
pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
pub const LIQUIDITY_RUNWAY: &str = "Liquidity Runway";

/// Rule names in evaluation order
pub const RULE_NAMES: [&str; 7] = [
    VALUATION,
    SOLVENCY,
    GROWTH,
    PROFITABILITY,
    EFFICIENCY,
    FREE_CASH_FLOW,
    LIQUIDITY_RUNWAY,
];

/// A rule predicate over one snapshot
pub type Rule = fn(&FinancialSnapshot, &RuleThresholds) -> RuleOutcome;

/// The rule set, in the order the breakdown reports it
pub const RULES: [Rule; 7] = [
    valuation,
    solvency,
    growth,
    profitability,
    efficiency,
    free_cash_flow,
    liquidity_runway,
];

fn outcome(rule: &str, passed: bool, detail: String) -> RuleOutcome {
    RuleOutcome {
        rule: rule.to_string(),
        status: RuleStatus::from_bool(passed),
        detail,
    }
}

fn unavailable(rule: &str, metric: &str) -> RuleOutcome {
    outcome(rule, false, format!("{} unavailable", metric))
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// `0 < P/E < limit`, the limit depending on the sector
pub fn valuation(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.pe_ratio.is_finite() {
        return unavailable(VALUATION, "P/E ratio");
    }
    let limit = t.pe_limit(&s.sector);

    if s.pe_ratio <= 0.0 {
        outcome(
            VALUATION,
            false,
            format!("P/E {:.1} is not positive (loss-making or undefined)", s.pe_ratio),
        )
    } else if s.pe_ratio < limit {
        outcome(VALUATION, true, format!("P/E {:.1} is within limit {:.0}", s.pe_ratio, limit))
    } else {
        outcome(VALUATION, false, format!("P/E {:.1} exceeds limit {:.0}", s.pe_ratio, limit))
    }
}

/// Debt/equity below the ceiling. Both sides are percentage-style, the
/// detail string shows them as plain ratios.
pub fn solvency(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.debt_to_equity.is_finite() {
        return unavailable(SOLVENCY, "Debt/Equity");
    }
    let ratio = s.debt_to_equity / 100.0;
    let ceiling = t.max_debt_to_equity / 100.0;

    if s.debt_to_equity < t.max_debt_to_equity {
        outcome(SOLVENCY, true, format!("Debt/Equity {:.2} is healthy (< {:.2})", ratio, ceiling))
    } else {
        outcome(SOLVENCY, false, format!("Debt/Equity {:.2} is risky (>= {:.2})", ratio, ceiling))
    }
}

pub fn growth(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.revenue_growth.is_finite() {
        return unavailable(GROWTH, "Revenue growth");
    }
    if s.revenue_growth > t.min_revenue_growth {
        outcome(
            GROWTH,
            true,
            format!("Revenue growth {} > {}", pct(s.revenue_growth), pct(t.min_revenue_growth)),
        )
    } else {
        outcome(GROWTH, false, format!("Revenue growth {} is sluggish", pct(s.revenue_growth)))
    }
}

pub fn profitability(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.profit_margins.is_finite() {
        return unavailable(PROFITABILITY, "Net margin");
    }
    if s.profit_margins > t.min_profit_margin {
        outcome(PROFITABILITY, true, format!("Net margin {} is healthy", pct(s.profit_margins)))
    } else {
        outcome(PROFITABILITY, false, format!("Net margin {} is thin", pct(s.profit_margins)))
    }
}

pub fn efficiency(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.roe.is_finite() {
        return unavailable(EFFICIENCY, "ROE");
    }
    if s.roe > t.min_roe {
        outcome(EFFICIENCY, true, format!("ROE {} indicates strong management", pct(s.roe)))
    } else {
        outcome(
            EFFICIENCY,
            false,
            format!("ROE {} is below target {}", pct(s.roe), pct(t.min_roe)),
        )
    }
}

pub fn free_cash_flow(s: &FinancialSnapshot, t: &RuleThresholds) -> RuleOutcome {
    if !s.free_cash_flow.is_finite() {
        return unavailable(FREE_CASH_FLOW, "Free cash flow");
    }
    if s.free_cash_flow > t.min_free_cash_flow {
        outcome(FREE_CASH_FLOW, true, "Generating positive free cash flow".to_string())
    } else {
        outcome(FREE_CASH_FLOW, false, "Burning cash (negative free cash flow)".to_string())
    }
}

/// Only loss-making companies have to show reserves covering operating
/// costs; a profitable company passes whatever its cash position.
pub fn liquidity_runway(s: &FinancialSnapshot, _t: &RuleThresholds) -> RuleOutcome {
    if !s.net_income.is_finite() {
        return unavailable(LIQUIDITY_RUNWAY, "Net income");
    }
    if s.net_income >= 0.0 {
        return outcome(
            LIQUIDITY_RUNWAY,
            true,
            "Company is profitable (liquidity not at risk)".to_string(),
        );
    }
    if !s.cash_reserves.is_finite() || !s.operating_costs.is_finite() {
        return unavailable(LIQUIDITY_RUNWAY, "Cash reserves or operating costs");
    }

    let cash_m = s.cash_reserves / 1e6;
    let costs_m = s.operating_costs / 1e6;
    if s.cash_reserves > s.operating_costs {
        outcome(
            LIQUIDITY_RUNWAY,
            true,
            format!("Cash reserves (${:.1}M) cover burn rate (${:.1}M)", cash_m, costs_m),
        )
    } else {
        outcome(
            LIQUIDITY_RUNWAY,
            false,
            format!("CRITICAL: cash (${:.1}M) insufficient for burn (${:.1}M)", cash_m, costs_m),
        )
    }
}
