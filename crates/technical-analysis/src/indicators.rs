use analysis_core::Bar;

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (n - 1); 0.0 below two points
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Simple Moving Average. Element `i` covers `data[i..i + period]`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }
    data.windows(period).map(mean).collect()
}

/// Exponential moving average with span weighting (`alpha = 2 / (span + 1)`),
/// normalised by the sum of weights seen so far. Same length as `data`:
/// element `i` is the weighted mean of `data[..=i]`.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return vec![];
    }

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let (mut weighted_sum, mut weight_total) = (0.0, 0.0);
    data.iter()
        .map(|&value| {
            weighted_sum = value + decay * weighted_sum;
            weight_total = 1.0 + decay * weight_total;
            weighted_sum / weight_total
        })
        .collect()
}

/// Relative Strength Index from plain `period`-bar averages of gains and
/// losses. Element 0 corresponds to `data[period]`.
///
/// No losses gives 100, a flat window gives 50.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let changes: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    changes
        .windows(period)
        .map(|window| {
            let avg_gain = mean(&window.iter().map(|c| c.max(0.0)).collect::<Vec<_>>());
            let avg_loss = mean(&window.iter().map(|c| (-c).max(0.0)).collect::<Vec<_>>());
            if avg_loss == 0.0 {
                if avg_gain == 0.0 { 50.0 } else { 100.0 }
            } else {
                100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
            }
        })
        .collect()
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD line, signal and histogram, each the same length as `data`.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let empty = MacdResult { macd_line: vec![], signal_line: vec![], histogram: vec![] };
    if data.is_empty() || fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return empty;
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    let macd_line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, signal_period);
    let histogram = macd_line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bands at `num_std` sample standard deviations around the SMA
pub fn bollinger_bands(data: &[f64], period: usize, num_std: f64) -> BollingerBands {
    if period < 2 || data.len() < period {
        return BollingerBands { upper: vec![], middle: vec![], lower: vec![] };
    }

    let mut upper = Vec::with_capacity(data.len() - period + 1);
    let mut middle = Vec::with_capacity(data.len() - period + 1);
    let mut lower = Vec::with_capacity(data.len() - period + 1);

    for window in data.windows(period) {
        let m = mean(window);
        let sd = std_dev(window);
        upper.push(m + num_std * sd);
        middle.push(m);
        lower.push(m - num_std * sd);
    }

    BollingerBands { upper, middle, lower }
}

/// Average True Range: plain `period`-bar mean of the true range.
/// The first bar has no previous close, so its true range is high - low.
/// Element 0 covers `bars[..period]`.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let high_low = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev_close) => high_low
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => high_low,
            }
        })
        .collect();

    sma(&true_ranges, period)
}

/// Rate of change (%) of the last value against the value `period` bars
/// from the end
pub fn roc(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let base = data[data.len() - period];
    let last = *data.last()?;
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

/// Annualized volatility (%) of simple daily returns
pub fn annualized_volatility(closes: &[f64]) -> f64 {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    std_dev(&returns) * 252f64.sqrt() * 100.0
}

/// Least-squares slope of the last `period` values, normalized by their
/// mean and expressed in percent per bar. Positive means uptrend.
pub fn trend_strength(data: &[f64], period: usize) -> f64 {
    if period < 2 || data.len() < period {
        return 0.0;
    }
    let recent = &data[data.len() - period..];
    let n = period as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(recent);
    if y_mean == 0.0 {
        return 0.0;
    }

    let (mut cov, mut var) = (0.0, 0.0);
    for (i, y) in recent.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (y - y_mean);
        var += dx * dx;
    }
    (cov / var) / y_mean * 100.0
}

/// Last volume against its `period`-bar average, in percent
pub fn volume_trend(volumes: &[f64], period: usize) -> f64 {
    if period == 0 || volumes.len() < period {
        return 0.0;
    }
    let avg = mean(&volumes[volumes.len() - period..]);
    match volumes.last() {
        Some(last) if avg > 0.0 => (last - avg) / avg * 100.0,
        _ => 0.0,
    }
}
