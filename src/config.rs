use crate::error::EvalError;
use crate::models::ModelId;
use crate::pricing::RateTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Wire protocol a model is reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat completions endpoint
    OpenAI,
    /// Google Gemini generateContent endpoint
    Gemini,
}

/// Configuration for a single backend model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model name, sent to the provider and used as the output label
    pub name: String,
    pub provider: ProviderKind,
    /// API base URL
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    pub env_var_api_key: String,
    /// Price in dollars per 1,000 tokens
    pub cost_per_1k: f64,
    /// Sampling temperature, provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ModelConfig {
    pub fn id(&self) -> ModelId {
        ModelId::new(&self.name)
    }
}

fn default_system_prompt() -> String {
    "You are an audit expert.".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    120
}

/// Root run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// System instruction sent to every model
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Maximum number of backend calls in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Models to evaluate, in output order
    pub models: Vec<ModelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            models: vec![
                ModelConfig {
                    name: "gpt-4o-mini".to_string(),
                    provider: ProviderKind::OpenAI,
                    api_endpoint: "https://api.openai.com/v1".to_string(),
                    env_var_api_key: "OPENAI_API_KEY".to_string(),
                    cost_per_1k: 0.0006,
                    temperature: Some(0.0),
                },
                ModelConfig {
                    name: "gemini-2.0-flash".to_string(),
                    provider: ProviderKind::Gemini,
                    api_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                    env_var_api_key: "GEMINI_API_KEY".to_string(),
                    cost_per_1k: 0.000001,
                    temperature: None,
                },
                ModelConfig {
                    name: "llama3.2-3b".to_string(),
                    provider: ProviderKind::OpenAI,
                    api_endpoint: "https://api.llama-api.com".to_string(),
                    env_var_api_key: "LLAMA_API_KEY".to_string(),
                    cost_per_1k: 0.0004,
                    temperature: None,
                },
            ],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Check invariants the rest of the run relies on
    pub fn validate(&self) -> Result<(), EvalError> {
        check_concurrency(self.concurrency)?;
        check_model_names(self.models.iter().map(|m| m.name.as_str()))?;

        for model in &self.models {
            if !(model.cost_per_1k >= 0.0) {
                return Err(EvalError::InvalidConfig(format!(
                    "cost_per_1k for {} must be non-negative",
                    model.name
                )));
            }
        }
        Ok(())
    }

    pub fn rate_table(&self) -> RateTable {
        self.models
            .iter()
            .fold(RateTable::new(), |table, m| table.with_rate(m.id(), m.cost_per_1k))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn check_concurrency(concurrency: usize) -> Result<(), EvalError> {
    if concurrency == 0 {
        return Err(EvalError::InvalidConfig("concurrency must be at least 1".to_string()));
    }
    Ok(())
}

/// At least one model, no name twice
pub fn check_model_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), EvalError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(EvalError::DuplicateModel(name.to_string()));
        }
    }
    if seen.is_empty() {
        return Err(EvalError::InvalidConfig("no models configured".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parsing() {
        let toml_content = r#"
system_prompt = "You are a careful reviewer."
concurrency = 2
timeout_secs = 30

[[models]]
name = "gpt-4o-mini"
provider = "openai"
api_endpoint = "https://api.openai.com/v1"
env_var_api_key = "OPENAI_API_KEY"
cost_per_1k = 0.0006
temperature = 0.0

[[models]]
name = "gemini-2.0-flash"
provider = "gemini"
api_endpoint = "https://generativelanguage.googleapis.com/v1beta"
env_var_api_key = "GEMINI_API_KEY"
cost_per_1k = 0.000001
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.system_prompt, "You are a careful reviewer.");
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].provider, ProviderKind::OpenAI);
        assert_eq!(config.models[0].temperature, Some(0.0));
        assert_eq!(config.models[1].provider, ProviderKind::Gemini);
        assert_eq!(config.models[1].temperature, None);
    }

    #[test]
    fn test_config_defaults() {
        let toml_content = r#"
[[models]]
name = "llama3.2-3b"
provider = "openai"
api_endpoint = "https://api.llama-api.com"
env_var_api_key = "LLAMA_API_KEY"
cost_per_1k = 0.0004
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.system_prompt, "You are an audit expert.");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_builtin_default_has_three_models() {
        let config = Config::default();
        config.validate().unwrap();

        let names: Vec<&str> = config.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["gpt-4o-mini", "gemini-2.0-flash", "llama3.2-3b"]);

        let rates = config.rate_table();
        assert_eq!(rates.rate(&ModelId::new("gpt-4o-mini")).unwrap(), 0.0006);
        assert_eq!(rates.rate(&ModelId::new("llama3.2-3b")).unwrap(), 0.0004);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = Config::default();
        config.models.push(config.models[0].clone());
        assert!(matches!(config.validate(), Err(EvalError::DuplicateModel(_))));
    }

    #[test]
    fn test_validate_rejects_empty_and_bad_values() {
        let mut config = Config::default();
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(EvalError::InvalidConfig(_))));

        let mut config = Config::default();
        config.models[1].cost_per_1k = -1.0;
        assert!(matches!(config.validate(), Err(EvalError::InvalidConfig(_))));

        let mut config = Config::default();
        config.models.clear();
        assert!(matches!(config.validate(), Err(EvalError::InvalidConfig(_))));
    }

    #[test]
    fn test_check_model_names() {
        assert!(check_model_names(["a", "b"]).is_ok());
        assert!(matches!(
            check_model_names(std::iter::empty::<&str>()),
            Err(EvalError::InvalidConfig(_))
        ));
        assert!(matches!(
            check_model_names(["a", "b", "a"]),
            Err(EvalError::DuplicateModel(name)) if name == "a"
        ));
    }

    #[test]
    fn test_unknown_provider_fails_to_parse() {
        let toml_content = r#"
[[models]]
name = "x"
provider = "carrier-pigeon"
api_endpoint = "http://localhost"
env_var_api_key = "X"
cost_per_1k = 0.1
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }
}
