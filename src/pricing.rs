use crate::error::EvalError;
use crate::models::{ModelId, ModelResponse};
use std::collections::HashMap;
use std::fmt::Display;

/// Build the user prompt shared verbatim by every backend
pub fn build_prompt(document: &str, question: &str) -> String {
    format!(
        "Below is an audit report:\n\n{}\n\nBased on this report, answer:\n{}",
        document, question
    )
}

/// Per-model price in dollars per 1,000 tokens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<ModelId, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, model: ModelId, cost_per_1k: f64) -> Self {
        self.rates.insert(model, cost_per_1k);
        self
    }

    /// Price per 1,000 tokens for a model
    pub fn rate(&self, model: &ModelId) -> Result<f64, EvalError> {
        self.rates
            .get(model)
            .copied()
            .ok_or_else(|| EvalError::UnknownModel(model.to_string()))
    }

    /// Cost of a call: `(total_tokens / 1000) * rate`
    pub fn compute_cost(&self, total_tokens: u64, model: &ModelId) -> Result<f64, EvalError> {
        Ok((total_tokens as f64 / 1000.0) * self.rate(model)?)
    }
}

/// Turn any adapter-level failure into the error-shaped response
pub fn make_error_response(model: &ModelId, error: impl Display) -> ModelResponse {
    let message = format!("{} error: {}", model, error);
    tracing::error!(model = %model, "{}", message);

    ModelResponse {
        text: String::new(),
        total_tokens: 0,
        cost: 0.0,
        model: model.clone(),
        error: Some(message),
    }
}
