use analysis_core::AnalysisError;
use symbolic_engine::RuleThresholds;

pub const DEFAULT_HISTORY_DAYS: i64 = 365;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Fetch price history and ask the return model for a prediction
    pub enable_predictor: bool,
    /// Ask the LLM for qualitative commentary
    pub enable_narrative: bool,
    /// Days of daily bars used for technical features
    pub history_days: i64,
    /// Max symbols analyzed at once in a batch
    pub batch_concurrency: usize,
    pub thresholds: RuleThresholds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enable_predictor: true,
            enable_narrative: true,
            history_days: DEFAULT_HISTORY_DAYS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            thresholds: RuleThresholds::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Build from `TRUSTIQ_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `TRUSTIQ_ENABLE_PREDICTOR` | `true`/`false` |
    /// | `TRUSTIQ_ENABLE_NARRATIVE` | `true`/`false` |
    /// | `TRUSTIQ_HISTORY_DAYS` | positive integer |
    /// | `TRUSTIQ_BATCH_CONCURRENCY` | positive integer |
    /// | `TRUSTIQ_THRESHOLDS_FILE` | path to a JSON `RuleThresholds` document |
    ///
    /// Unset variables keep their defaults; a value that does not parse is an
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("TRUSTIQ_ENABLE_PREDICTOR") {
            config.enable_predictor = parse_bool("TRUSTIQ_ENABLE_PREDICTOR", &v)?;
        }
        if let Some(v) = lookup("TRUSTIQ_ENABLE_NARRATIVE") {
            config.enable_narrative = parse_bool("TRUSTIQ_ENABLE_NARRATIVE", &v)?;
        }
        if let Some(v) = lookup("TRUSTIQ_HISTORY_DAYS") {
            config.history_days = parse_positive("TRUSTIQ_HISTORY_DAYS", &v)?;
        }
        if let Some(v) = lookup("TRUSTIQ_BATCH_CONCURRENCY") {
            config.batch_concurrency = parse_positive::<usize>("TRUSTIQ_BATCH_CONCURRENCY", &v)?;
        }
        if let Some(path) = lookup("TRUSTIQ_THRESHOLDS_FILE") {
            let raw = std::fs::read_to_string(path.trim()).map_err(|e| {
                AnalysisError::Config(format!("cannot read thresholds file {}: {}", path, e))
            })?;
            config.thresholds = parse_thresholds(&raw)?;
        }

        config.thresholds.validate()?;
        Ok(config)
    }
}

/// Parse a JSON thresholds document; missing keys keep their defaults.
pub fn parse_thresholds(raw: &str) -> Result<RuleThresholds, AnalysisError> {
    let thresholds: RuleThresholds = serde_json::from_str(raw)
        .map_err(|e| AnalysisError::Config(format!("invalid thresholds: {}", e)))?;
    thresholds.validate()?;
    Ok(thresholds)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AnalysisError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AnalysisError::Config(format!("{} must be a boolean, got '{}'", key, other))),
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, AnalysisError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(AnalysisError::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = OrchestratorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.history_days, 365);
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn test_overrides() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            ("TRUSTIQ_ENABLE_PREDICTOR", "false"),
            ("TRUSTIQ_ENABLE_NARRATIVE", "No"),
            ("TRUSTIQ_HISTORY_DAYS", "120"),
            ("TRUSTIQ_BATCH_CONCURRENCY", " 3 "),
        ]))
        .unwrap();
        assert!(!config.enable_predictor);
        assert!(!config.enable_narrative);
        assert_eq!(config.history_days, 120);
        assert_eq!(config.batch_concurrency, 3);
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        for pairs in [
            [("TRUSTIQ_ENABLE_PREDICTOR", "maybe")],
            [("TRUSTIQ_HISTORY_DAYS", "-5")],
            [("TRUSTIQ_BATCH_CONCURRENCY", "0")],
            [("TRUSTIQ_BATCH_CONCURRENCY", "eight")],
            [("TRUSTIQ_THRESHOLDS_FILE", "/nonexistent/thresholds.json")],
        ] {
            let err = OrchestratorConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, AnalysisError::Config(_)), "{:?}", pairs);
        }
    }

    #[test]
    fn test_parse_thresholds_partial_document() {
        let t = parse_thresholds(r#"{"default_pe_limit": 25.0, "min_roe": 0.2}"#).unwrap();
        assert_eq!(t.default_pe_limit, 25.0);
        assert_eq!(t.min_roe, 0.2);
        assert_eq!(t.max_debt_to_equity, 200.0);

        assert!(parse_thresholds("not json").is_err());
        assert!(parse_thresholds(r#"{"max_debt_to_equity": 0}"#).is_err());
    }
}
