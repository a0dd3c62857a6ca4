//! Backend adapters and the registry that builds them from configuration

pub mod gemini;
pub mod openai;
pub mod traits;

pub use gemini::GeminiAdapter;
pub use openai::OpenAIAdapter;
pub use traits::{AdapterSettings, ModelAdapter};

use std::sync::Arc;

use crate::config::{Config, ProviderKind};
use crate::error::EvalError;

/// Build one adapter per configured model, reading credentials from the
/// environment
pub fn create_adapters(config: &Config) -> Result<Vec<Arc<dyn ModelAdapter>>, EvalError> {
    create_adapters_with(config, |var| std::env::var(var).ok())
}

/// Build adapters with a custom credential lookup
pub fn create_adapters_with(
    config: &Config,
    lookup_key: impl Fn(&str) -> Option<String>,
) -> Result<Vec<Arc<dyn ModelAdapter>>, EvalError> {
    config.validate()?;
    let rates = Arc::new(config.rate_table());

    config
        .models
        .iter()
        .map(|model| -> Result<Arc<dyn ModelAdapter>, EvalError> {
            let settings = AdapterSettings::from_config(model, config, rates.clone(), &lookup_key)?;
            let adapter: Arc<dyn ModelAdapter> = match model.provider {
                ProviderKind::OpenAI => Arc::new(OpenAIAdapter::new(settings)),
                ProviderKind::Gemini => Arc::new(GeminiAdapter::new(settings)),
            };
            tracing::debug!(model = %adapter.model(), provider = ?model.provider, "Registered model");
            Ok(adapter)
        })
        .collect()
}
