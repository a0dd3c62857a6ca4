use std::time::Duration;

/// Caller or configuration bugs. These abort the run.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("No rate configured for model: {0}")]
    UnknownModel(String),

    #[error("Report {0} has no questions to aggregate")]
    EmptyReport(String),

    #[error("Model {0} is configured more than once")]
    DuplicateModel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures inside a single backend call. Never leave the adapter that hit them.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("{0} not found")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI-compatible API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
