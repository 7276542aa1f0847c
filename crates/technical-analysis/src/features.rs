//! Technical feature extraction for the return predictor.

use analysis_core::{Bar, FeatureVector, FinancialSnapshot, TechnicalFeatures};
use crate::indicators::*;

/// Bars required before any indicator is computed
pub const MIN_BARS: usize = 50;

fn last_or(values: &[f64], default: f64) -> f64 {
    values.last().copied().filter(|v| v.is_finite()).unwrap_or(default)
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

fn pct_distance(price: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    finite_or((price - reference) / reference * 100.0, 0.0)
}

/// Compute the indicator set from daily bars (oldest first).
///
/// With fewer than `MIN_BARS` bars the neutral defaults are returned, so the
/// predictor always receives a complete vector.
pub fn compute_features(bars: &[Bar]) -> TechnicalFeatures {
    if bars.len() < MIN_BARS {
        tracing::debug!("Only {} bars, using neutral technical features", bars.len());
        return TechnicalFeatures::default();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let price = closes[closes.len() - 1];
    let defaults = TechnicalFeatures::default();

    let macd_result = macd(&closes, 12, 26, 9);
    let sma_50 = last_or(&sma(&closes, 50), 0.0);
    let sma_200 = if closes.len() >= 200 {
        last_or(&sma(&closes, 200), 0.0)
    } else {
        mean(&closes)
    };

    let bands = bollinger_bands(&closes, 20, 2.0);
    let (bb_upper, bb_lower) = match (bands.upper.last(), bands.lower.last()) {
        (Some(&u), Some(&l)) if u.is_finite() && l.is_finite() => (u, l),
        _ => (price * 1.1, price * 0.9),
    };
    let bb_position = if bb_upper > bb_lower {
        finite_or((price - bb_lower) / (bb_upper - bb_lower), defaults.bb_position)
    } else {
        defaults.bb_position
    };

    let avg_volume = mean(&volumes);
    let volume_ratio = if avg_volume > 0.0 {
        finite_or(volumes[volumes.len() - 1] / avg_volume, defaults.volume_ratio)
    } else {
        defaults.volume_ratio
    };

    TechnicalFeatures {
        rsi: last_or(&rsi(&closes, 14), defaults.rsi),
        macd: last_or(&macd_result.macd_line, 0.0),
        macd_signal: last_or(&macd_result.signal_line, 0.0),
        roc: roc(&closes, 20).filter(|v| v.is_finite()).unwrap_or(0.0),
        sma_50,
        sma_200,
        ema_20: last_or(&ema(&closes, 20), 0.0),
        price_vs_sma50: pct_distance(price, sma_50),
        price_vs_sma200: pct_distance(price, sma_200),
        bb_upper,
        bb_lower,
        bb_position,
        atr: last_or(&atr(bars, 14), 0.0),
        volatility: finite_or(annualized_volatility(&closes), 0.0),
        volume_trend: finite_or(volume_trend(&volumes, 20), 0.0),
        volume_ratio,
        trend_strength: finite_or(trend_strength(&closes, 20), 0.0),
    }
}

/// Predictor input: fundamentals, the symbolic trust score, then technicals.
/// The order is fixed; the model was trained on it.
pub fn build_feature_vector(
    snapshot: &FinancialSnapshot,
    trust_score: f64,
    technical: &TechnicalFeatures,
) -> FeatureVector {
    let mut fv = FeatureVector::new();

    fv.push("pe_ratio", snapshot.pe_ratio);
    fv.push("debt_to_equity", snapshot.debt_to_equity);
    fv.push("revenue_growth", snapshot.revenue_growth);
    fv.push("profit_margins", snapshot.profit_margins);
    fv.push("roe", snapshot.roe);
    fv.push("free_cash_flow", snapshot.free_cash_flow);
    fv.push("dividend_yield", snapshot.dividend_yield);
    fv.push("cash_reserves", snapshot.cash_reserves);
    fv.push("operating_costs", snapshot.operating_costs);
    fv.push("net_income", snapshot.net_income);
    fv.push("analyst_target", snapshot.analyst_target);
    fv.push("current_price", snapshot.current_price);

    fv.push("trust_score", trust_score);

    fv.push("rsi", technical.rsi);
    fv.push("macd", technical.macd);
    fv.push("macd_signal", technical.macd_signal);
    fv.push("roc", technical.roc);
    fv.push("sma_50", technical.sma_50);
    fv.push("sma_200", technical.sma_200);
    fv.push("ema_20", technical.ema_20);
    fv.push("price_vs_sma50", technical.price_vs_sma50);
    fv.push("price_vs_sma200", technical.price_vs_sma200);
    fv.push("bb_upper", technical.bb_upper);
    fv.push("bb_lower", technical.bb_lower);
    fv.push("bb_position", technical.bb_position);
    fv.push("atr", technical.atr);
    fv.push("volatility", technical.volatility);
    fv.push("volume_trend", technical.volume_trend);
    fv.push("volume_ratio", technical.volume_ratio);
    fv.push("trend_strength", technical.trend_strength);

    fv
}
