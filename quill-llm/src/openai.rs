use crate::traits::{Completion, CompletionClient, CompletionError, CompletionParams};
use crate::LlmSettings;
use async_trait::async_trait;
use quill_common::{QuillError, Result};
use quill_http::HttpClient;
use serde::{Deserialize, Serialize};

/// Client for the OpenAI Chat Completions API (or any compatible gateway).
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client from explicit settings. Each completion is a single
    /// upstream call.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(QuillError::Config("OpenAI API key is empty".to_string()));
        }
        let client = HttpClient::new(&settings.endpoint)
            .map_err(|e| QuillError::Init(format!("HttpClient init failed: {e}")))?
            .with_timeout(settings.timeout);

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        system_role: &str,
        user_prompt: &str,
        params: CompletionParams,
    ) -> std::result::Result<Completion, CompletionError> {
        let req = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_role,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: params.max_output_tokens,
            temperature: params.temperature,
        };

        tracing::debug!(
            model=%self.model,
            prompt_chars=user_prompt.chars().count(),
            max_tokens=params.max_output_tokens,
            temperature=params.temperature,
            "openai.complete.start"
        );

        let resp: ChatResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                CompletionError::Malformed("response carried no message content".to_string())
            })?;

        let tokens_used = resp.usage.map(|u| u.total_tokens);
        tracing::debug!(
            model=?resp.model,
            reply_chars=text.chars().count(),
            tokens_used=?tokens_used,
            "openai.complete.done"
        );

        Ok(Completion {
            text,
            model: resp.model,
            tokens_used,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
