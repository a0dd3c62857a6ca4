//! OpenAI-compatible chat completions adapter (OpenAI, Llama API, ...)

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;

use super::traits::{AdapterSettings, Completion, ModelAdapter};
use crate::error::AdapterError;
use crate::models::{ModelId, ModelResponse};
use crate::pricing::build_prompt;

/// Adapter for any endpoint speaking the OpenAI chat completions protocol
pub struct OpenAIAdapter {
    settings: AdapterSettings,
}

impl OpenAIAdapter {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }

    /// Create the OpenAI client for the configured endpoint
    fn create_client(&self) -> Result<Client<OpenAIConfig>, AdapterError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(self.settings.api_key()?)
            .with_api_base(&self.settings.api_endpoint);

        Ok(Client::with_config(openai_config))
    }

    /// Build the chat completion request
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, AdapterError> {
        let system_message: ChatCompletionRequestMessage =
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.settings.system_prompt.clone())
                .build()?
                .into();

        let user_message: ChatCompletionRequestMessage =
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()?
                .into();

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.settings.model.as_str())
            .messages([system_message, user_message]);
        if let Some(temperature) = self.settings.temperature {
            args.temperature(temperature);
        }

        Ok(args.build()?)
    }

    /// Extract text and usage from the API response
    fn extract_completion(response: CreateChatCompletionResponse) -> Completion {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Completion {
            text,
            total_tokens: response.usage.map(|usage| u64::from(usage.total_tokens)),
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAIAdapter {
    fn model(&self) -> &ModelId {
        &self.settings.model
    }

    async fn ask(&self, document: &str, question: &str) -> ModelResponse {
        let prompt = build_prompt(document, question);

        self.settings
            .complete(async {
                let client = self.create_client()?;
                let request = self.build_request(&prompt)?;

                tracing::info!(model = %self.settings.model, "Calling OpenAI-compatible model");
                let response = client.chat().create(request).await?;

                Ok::<_, AdapterError>(Self::extract_completion(response))
            })
            .await
    }
}
