//! Google Gemini generateContent adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{AdapterSettings, Completion, ModelAdapter};
use crate::error::AdapterError;
use crate::models::{ModelId, ModelResponse};
use crate::pricing::build_prompt;

/// Adapter for the Gemini REST API
pub struct GeminiAdapter {
    settings: AdapterSettings,
    http_client: Client,
}

impl GeminiAdapter {
    pub fn new(settings: AdapterSettings) -> Self {
        let http_client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build Gemini HTTP client, falling back to defaults: {}", e);
                Client::new()
            });

        Self {
            settings,
            http_client,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_endpoint, self.settings.model
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content::text(None, &self.settings.system_prompt),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: self
                .settings
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, AdapterError> {
        let api_key = self.settings.api_key()?;
        let url = self.api_url();

        tracing::info!(model = %self.settings.model, "Calling Gemini model");
        tracing::debug!("Sending request to Gemini: {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        Self::extract_completion(parsed)
    }

    fn extract_completion(response: GenerateContentResponse) -> Result<Completion, AdapterError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::MalformedResponse("no candidates returned".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Completion {
            text: text.trim().to_string(),
            total_tokens: response
                .usage_metadata
                .and_then(|usage| usage.total_token_count),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u64>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn model(&self) -> &ModelId {
        &self.settings.model
    }

    async fn ask(&self, document: &str, question: &str) -> ModelResponse {
        let prompt = build_prompt(document, question);
        self.settings.complete(self.generate(&prompt)).await
    }
}
