use analysis_core::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MLError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MLResult<T> = Result<T, MLError>;

impl From<MLError> for AnalysisError {
    fn from(err: MLError) -> Self {
        match err {
            MLError::ServiceUnavailable(msg) => AnalysisError::Unavailable(msg),
            MLError::ModelNotLoaded => AnalysisError::Unavailable("model not loaded".to_string()),
            MLError::Config(msg) => AnalysisError::Config(msg),
            MLError::InvalidResponse(msg) => AnalysisError::InvalidData(msg),
            other => AnalysisError::ApiError(other.to_string()),
        }
    }
}
