//! Qualitative commentary from an OpenAI-compatible chat completions API
//! (Groq by default).

use analysis_core::{AnalysisError, FinancialSnapshot, NarrativeProvider, TrustReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use crate::error::{MLError, MLResult};
use crate::key_ring::KeyRing;

const NO_REASONING: &str = "No reasoning provided.";

const SYSTEM_PROMPT: &str = "You are a financial analyst. You receive a company's fundamentals \
and the result of a rule-based health check. Output a single flat JSON object with the key \
\"reasoning\" holding two to four sentences of qualitative commentary. Do not nest the object \
under the ticker symbol.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct NarrativeClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    keys: Arc<KeyRing>,
}

impl NarrativeClient {
    /// `api_keys` are tried in order; a 429 on the active key moves to the next.
    pub fn new(base_url: String, model: String, api_keys: Vec<String>, timeout: Duration) -> Self {
        Self::with_key_ring(base_url, model, KeyRing::new(api_keys), timeout)
    }

    pub fn with_key_ring(base_url: String, model: String, keys: KeyRing, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            keys: Arc::new(keys),
        }
    }

    fn user_prompt(symbol: &str, snapshot: &FinancialSnapshot, report: &TrustReport) -> MLResult<String> {
        let metrics = serde_json::to_string(snapshot)?;
        let rules = report
            .breakdown
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Symbol: {}\nMetrics: {}\nTrust score: {:.1} ({})\nRules:\n{}",
            symbol, metrics, report.score, report.verdict, rules
        ))
    }

    /// Ask the model for commentary and return its reasoning text
    pub async fn commentary(
        &self,
        symbol: &str,
        snapshot: &FinancialSnapshot,
        report: &TrustReport,
    ) -> MLResult<String> {
        if self.keys.is_empty() {
            return Err(MLError::Config("GROQ_API_KEY is not set".to_string()));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: Self::user_prompt(symbol, snapshot, report)? },
            ],
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut index = self.keys.current_index();
        let mut attempts = 0;

        let response = loop {
            let api_key = self
                .keys
                .key(index)
                .ok_or_else(|| MLError::Config(format!("no API key at position {}", index + 1)))?;

            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await?;

            if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                break response;
            }

            attempts += 1;
            tracing::warn!("LLM rate limit hit on key {} of {}", index + 1, self.keys.len());
            match self.keys.rotate_from(index) {
                Some(next) if attempts < self.keys.len() => {
                    tracing::info!("Rotated to LLM key {}", next + 1);
                    index = next;
                }
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MLError::ServiceUnavailable(format!(
                        "Status: 429 Too Many Requests on all {} key(s) {}",
                        self.keys.len(),
                        body
                    )));
                }
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("LLM request for {} failed with {}", symbol, status);
            return Err(MLError::ServiceUnavailable(format!("Status: {} {}", status, body)));
        }

        let chat = response.json::<ChatResponse>().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MLError::InvalidResponse("empty completion".to_string()))?;

        Ok(extract_reasoning(&content))
    }
}

#[async_trait]
impl NarrativeProvider for NarrativeClient {
    async fn narrate(
        &self,
        symbol: &str,
        snapshot: &FinancialSnapshot,
        report: &TrustReport,
    ) -> Result<String, AnalysisError> {
        Ok(self.commentary(symbol, snapshot, report).await?)
    }
}

fn parse_lenient(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn reasoning_field(value: &Value) -> Option<String> {
    value
        .get("reasoning")
        .and_then(|r| r.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull the `reasoning` text out of a model reply.
///
/// Accepts plain JSON, JSON surrounded by prose or code fences, and one level
/// of wrapping under a single key (`{"TSLA": {"reasoning": ...}}`). A reply
/// with no JSON object is returned as-is.
pub fn extract_reasoning(text: &str) -> String {
    let trimmed = text.trim();
    let value = match parse_lenient(trimmed) {
        Some(v) => v,
        None if trimmed.is_empty() => return NO_REASONING.to_string(),
        None => return trimmed.to_string(),
    };

    if let Some(reasoning) = reasoning_field(&value) {
        return reasoning;
    }

    match value.as_object() {
        Some(obj) if obj.len() == 1 => obj
            .values()
            .next()
            .and_then(reasoning_field)
            .unwrap_or_else(|| NO_REASONING.to_string()),
        _ => NO_REASONING.to_string(),
    }
}
