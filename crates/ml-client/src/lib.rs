pub mod error;
pub mod key_ring;
pub mod narrative;
pub mod price_predictor;

pub use error::{MLError, MLResult};
pub use key_ring::{groq_keys, KeyRing};
pub use narrative::{extract_reasoning, NarrativeClient};
pub use price_predictor::ReturnPredictorClient;

use std::time::Duration;

pub const DEFAULT_PREDICTOR_URL: &str = "http://localhost:8003";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration for the external ML and LLM services
#[derive(Debug, Clone)]
pub struct MLConfig {
    pub predictor_url: String,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Groq keys in rotation order
    pub llm_api_keys: Vec<String>,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            predictor_url: DEFAULT_PREDICTOR_URL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_keys: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MLConfig {
    /// Read `ML_PREDICTOR_URL`, `LLM_BASE_URL`, `LLM_MODEL`, `GROQ_API_KEY`,
    /// `GROQ_API_KEY_2` to `GROQ_API_KEY_9` and `ML_TIMEOUT_SECS`, keeping the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            predictor_url: lookup("ML_PREDICTOR_URL").unwrap_or(defaults.predictor_url),
            llm_base_url: lookup("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: lookup("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_api_keys: groq_keys(&lookup),
            timeout: lookup("ML_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };
        tracing::debug!("Loaded {} LLM API key(s)", config.llm_api_keys.len());
        config
    }

    pub fn predictor(&self) -> ReturnPredictorClient {
        ReturnPredictorClient::new(self.predictor_url.clone(), self.timeout)
    }

    pub fn narrator(&self) -> NarrativeClient {
        NarrativeClient::new(
            self.llm_base_url.clone(),
            self.llm_model.clone(),
            self.llm_api_keys.clone(),
            self.timeout,
        )
    }
}
