use async_trait::async_trait;
use quill_http::HttpError;
use serde::{Deserialize, Serialize};

/// Raw reply from a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// Output budget and sampling temperature for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl CompletionParams {
    pub const fn new(max_output_tokens: u32, temperature: f32) -> Self {
        Self {
            max_output_tokens,
            temperature,
        }
    }
}

/// Every way a completion call can fail. Callers treat all variants alike;
/// the split exists for logs and metrics.
#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("authentication rejected by provider: {0}")]
    Auth(String),

    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("provider error: {0}")]
    Api(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CompletionError {
    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Network(_) => "network",
            CompletionError::Timeout => "timeout",
            CompletionError::Auth(_) => "auth",
            CompletionError::RateLimit(_) => "rate_limit",
            CompletionError::Api(_) => "api",
            CompletionError::Malformed(_) => "malformed",
            CompletionError::Config(_) => "config",
        }
    }
}

impl From<HttpError> for CompletionError {
    fn from(e: HttpError) -> Self {
        if e.is_rate_limited() {
            return CompletionError::RateLimit(e.to_string());
        }
        if e.is_auth() {
            return CompletionError::Auth(e.to_string());
        }
        match e {
            HttpError::Timeout(_) => CompletionError::Timeout,
            HttpError::Network(msg) => CompletionError::Network(msg),
            HttpError::Decode(msg, snippet) => {
                CompletionError::Malformed(format!("{msg} (body: {snippet})"))
            }
            HttpError::Url(msg) | HttpError::Build(msg) => CompletionError::Config(msg),
            other @ HttpError::Api { .. } => CompletionError::Api(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one system role + user prompt pair and return the raw reply text.
    ///
    /// Implementations perform exactly one upstream call and never retry.
    async fn complete(
        &self,
        system_role: &str,
        user_prompt: &str,
        params: CompletionParams,
    ) -> Result<Completion, CompletionError>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
