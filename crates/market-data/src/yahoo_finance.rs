use analysis_core::{AnalysisError, Bar, FinancialSnapshot, SnapshotProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// quoteSummary modules needed to populate a snapshot
const SUMMARY_MODULES: &str =
    "price,summaryProfile,financialData,defaultKeyStatistics,summaryDetail,incomeStatementHistory";

/// Modules searched, in order, for a metric
const METRIC_MODULES: [&str; 4] = ["financialData", "summaryDetail", "defaultKeyStatistics", "price"];

const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    retry_wait: std::time::Duration,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (a proxy or a test server)
    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_wait: std::time::Duration::from_secs(5),
        }
    }

    /// Wait between 429 retries
    pub fn with_retry_wait(mut self, wait: std::time::Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    /// GET `url` as JSON, retrying when Yahoo answers 429.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AnalysisError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            let status = response.status();
            if status.as_u16() == 429 {
                if attempt == MAX_ATTEMPTS {
                    tracing::warn!("Yahoo 429 rate limited, giving up after {} attempts", MAX_ATTEMPTS);
                    break;
                }
                tracing::warn!(
                    "Yahoo 429 rate limited, waiting {:?} before retry {}/{}",
                    self.retry_wait, attempt, MAX_ATTEMPTS
                );
                tokio::time::sleep(self.retry_wait).await;
                continue;
            }
            if !status.is_success() {
                return Err(AnalysisError::ApiError(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()));
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited by Yahoo after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// Fetch fundamentals and map them into a defaulted snapshot
    pub async fn get_snapshot(&self, symbol: &str) -> Result<FinancialSnapshot, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let json = self
            .get_json(&url, &[("modules", SUMMARY_MODULES.to_string())])
            .await?;
        snapshot_from_summary(symbol, &json)
    }

    /// Daily bars covering the last `days` calendar days, oldest first
    pub async fn get_daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError> {
        let now = Utc::now();
        let start = now - Duration::days(days.max(1));
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let json = self
            .get_json(
                &url,
                &[
                    ("period1", start.timestamp().to_string()),
                    ("period2", now.timestamp().to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;
        bars_from_chart(&json)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for YahooFinanceClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<FinancialSnapshot, AnalysisError> {
        self.get_snapshot(symbol).await
    }

    async fn fetch_daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError> {
        self.get_daily_bars(symbol, days).await
    }
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`; empty objects and
/// nulls mean missing.
fn number(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    value
        .as_f64()
        .or_else(|| value.get("raw").and_then(|v| v.as_f64()))
        .filter(|v| v.is_finite())
}

fn metric(result: &Value, key: &str) -> Option<f64> {
    METRIC_MODULES
        .iter()
        .find_map(|module| number(result.get(module).and_then(|m| m.get(key))))
}

/// Map a quoteSummary response into a snapshot. Every metric Yahoo omits
/// takes its safe default; only a response with no result at all is an error.
pub fn snapshot_from_summary(symbol: &str, json: &Value) -> Result<FinancialSnapshot, AnalysisError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| AnalysisError::InvalidData("Missing quoteSummary".to_string()))?;

    if let Some(description) = summary
        .get("error")
        .and_then(|e| e.get("description"))
        .and_then(|d| d.as_str())
    {
        return Err(AnalysisError::ApiError(format!("{}: {}", symbol, description)));
    }

    let result = summary
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InsufficientData(format!("No fundamental data found for {}", symbol)))?;

    let sector = result
        .get("summaryProfile")
        .and_then(|p| p.get("sector"))
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string();

    let current_price = metric(result, "currentPrice")
        .or_else(|| metric(result, "regularMarketPrice"))
        .unwrap_or(0.0);

    let operating_costs = result
        .get("incomeStatementHistory")
        .and_then(|h| h.get("incomeStatementHistory"))
        .and_then(|arr| arr.as_array())
        .and_then(|arr| arr.first())
        .and_then(|latest| number(latest.get("totalOperatingExpenses")))
        .or_else(|| metric(result, "totalOperatingExpenses"))
        .unwrap_or(0.0);

    let snapshot = FinancialSnapshot {
        symbol: symbol.to_string(),
        sector,
        current_price,
        pe_ratio: metric(result, "trailingPE").unwrap_or(0.0),
        debt_to_equity: metric(result, "debtToEquity").unwrap_or(0.0),
        revenue_growth: metric(result, "revenueGrowth").unwrap_or(0.0),
        cash_reserves: metric(result, "totalCash").unwrap_or(0.0),
        operating_costs,
        net_income: metric(result, "netIncomeToCommon").unwrap_or(0.0),
        profit_margins: metric(result, "profitMargins").unwrap_or(0.0),
        roe: metric(result, "returnOnEquity").unwrap_or(0.0),
        free_cash_flow: metric(result, "freeCashflow").unwrap_or(0.0),
        dividend_yield: metric(result, "dividendYield").unwrap_or(0.0),
        analyst_target: metric(result, "targetMeanPrice").unwrap_or(0.0),
    }
    .sanitized();

    Ok(snapshot)
}

/// Parse a v8 chart response into bars, skipping rows with null fields
pub fn bars_from_chart(json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let chart = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InsufficientData("No chart data found".to_string()))?;

    let timestamps = match chart.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InvalidData("No quote data in chart".to_string()))?;

    fn series<'a>(quote: &'a Value, name: &str) -> Result<&'a Vec<Value>, AnalysisError> {
        quote
            .get(name)
            .and_then(|v| v.as_array())
            .ok_or_else(|| AnalysisError::InvalidData(format!("No {} series in chart", name)))
    }
    let opens = series(quote, "open")?;
    let highs = series(quote, "high")?;
    let lows = series(quote, "low")?;
    let closes = series(quote, "close")?;
    let volumes = series(quote, "volume")?;

    let at = |values: &Vec<Value>, i: usize| values.get(i).and_then(|v| v.as_f64());

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        if let (Some(ts), Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            ts.as_i64(),
            at(opens, i),
            at(highs, i),
            at(lows, i),
            at(closes, i),
            at(volumes, i),
        ) {
            let timestamp: DateTime<Utc> = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| AnalysisError::InvalidData(format!("Invalid timestamp {}", ts)))?;
            bars.push(Bar { timestamp, open, high, low, close, volume });
        }
    }

    Ok(bars)
}
