//! Backend adapter contract shared by every model provider

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ModelConfig};
use crate::error::{AdapterError, EvalError};
use crate::models::{ModelId, ModelResponse};
use crate::pricing::{RateTable, make_error_response};

/// A backend that answers a question about a document.
///
/// Implementations never fail: transport, credential and payload problems
/// come back as an error-shaped [`ModelResponse`].
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Model this adapter reports results for
    fn model(&self) -> &ModelId;

    /// Ask `question` against `document`
    async fn ask(&self, document: &str, question: &str) -> ModelResponse;
}

/// Raw provider answer before pricing
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Provider usage accounting, when reported
    pub total_tokens: Option<u64>,
}

/// Settings common to all adapters
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub model: ModelId,
    pub api_endpoint: String,
    pub env_var_api_key: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
    pub rates: Arc<RateTable>,
}

impl AdapterSettings {
    /// Resolve settings for one configured model. The credential is looked up
    /// through `lookup_key`; a missing one is kept as `None` and only reported
    /// when the adapter is asked something.
    pub fn from_config(
        model: &ModelConfig,
        config: &Config,
        rates: Arc<RateTable>,
        lookup_key: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EvalError> {
        let id = model.id();
        rates.rate(&id)?;

        let api_key = lookup_key(&model.env_var_api_key).filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                model = %id,
                "{} is not set; {} will be reported as failed",
                model.env_var_api_key,
                id
            );
        }

        Ok(Self {
            model: id,
            api_endpoint: model.api_endpoint.trim_end_matches('/').to_string(),
            env_var_api_key: model.env_var_api_key.clone(),
            api_key,
            system_prompt: config.system_prompt.clone(),
            temperature: model.temperature,
            timeout: config.timeout(),
            rates,
        })
    }

    pub fn api_key(&self) -> Result<&str, AdapterError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AdapterError::MissingCredential(self.env_var_api_key.clone()))
    }

    /// Run one provider call under the timeout and shape the outcome into a
    /// [`ModelResponse`].
    pub async fn complete<F>(&self, call: F) -> ModelResponse
    where
        F: Future<Output = Result<Completion, AdapterError>>,
    {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(completion) => self.priced(completion),
            Err(e) => make_error_response(&self.model, e),
        }
    }

    fn priced(&self, completion: Completion) -> ModelResponse {
        let total_tokens = match completion.total_tokens {
            Some(tokens) => tokens,
            None => {
                tracing::warn!(model = %self.model, "Provider reported no usage; recording zero tokens");
                0
            }
        };
        if completion.text.is_empty() && total_tokens == 0 {
            return make_error_response(
                &self.model,
                AdapterError::MalformedResponse("empty completion".to_string()),
            );
        }

        match self.rates.compute_cost(total_tokens, &self.model) {
            Ok(cost) => {
                tracing::debug!(model = %self.model, total_tokens, cost, "Model call completed");
                ModelResponse::success(self.model.clone(), completion.text, total_tokens, cost)
            }
            Err(e) => make_error_response(&self.model, e),
        }
    }
}
