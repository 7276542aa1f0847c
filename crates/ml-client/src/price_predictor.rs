use analysis_core::{AnalysisError, FeatureVector, ReturnPredictor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

#[derive(Debug, Clone, Serialize)]
struct PredictionRequest<'a> {
    symbol: &'a str,
    feature_names: &'a [String],
    features: &'a [f64],
}

#[derive(Debug, Clone, Deserialize)]
struct PredictionResponse {
    predicted_return: f64,
}

/// Client for the gradient-boosted return model served over HTTP
#[derive(Clone)]
pub struct ReturnPredictorClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReturnPredictorClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Predicted forward return (%) for one feature vector
    pub async fn predict(&self, symbol: &str, features: &FeatureVector) -> MLResult<f64> {
        let request = PredictionRequest {
            symbol,
            feature_names: &features.names,
            features: &features.values,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Return model request for {} failed: {}", symbol, status);
            if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                return Err(MLError::ModelNotLoaded);
            }
            return Err(MLError::ServiceUnavailable(format!("Status: {}", status)));
        }

        let result = response.json::<PredictionResponse>().await?;
        if !result.predicted_return.is_finite() {
            tracing::warn!("Return model sent a non-finite prediction for {}", symbol);
            return Err(MLError::InvalidResponse(
                "predicted_return is not finite".to_string(),
            ));
        }
        tracing::debug!("Predicted return for {}: {:.2}%", symbol, result.predicted_return);
        Ok(result.predicted_return)
    }

    /// Check service health
    pub async fn health(&self) -> MLResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ReturnPredictor for ReturnPredictorClient {
    async fn predict_return(&self, symbol: &str, features: &FeatureVector) -> Result<f64, AnalysisError> {
        Ok(self.predict(symbol, features).await?)
    }
}
