//! Completion provider integration and AI content checks for Quill.
//!
//! [`traits::CompletionClient`] is the seam to the provider; [`openai::OpenAiClient`]
//! is the production implementation and [`mock::ScriptedClient`] the test one.
//! [`checker::ContentChecker`] turns a client into the three editorial checks.
//!
//! # Examples
//! ```no_run
//! use std::time::Duration;
//! use quill_llm::{connect, LlmSettings};
//! use quill_llm::checker::ContentChecker;
//!
//! # #[tokio::main]
//! # async fn main() -> quill_common::Result<()> {
//! let settings = LlmSettings {
//!     api_key: "sk-test".into(),
//!     model: "gpt-3.5-turbo".into(),
//!     endpoint: "https://api.openai.com/v1".into(),
//!     timeout: Duration::from_secs(60),
//! };
//! let checker = ContentChecker::new(connect(&settings)?);
//! let verdict = checker.check_inappropriate_content("Bonjour").await;
//! assert!(verdict.appropriate || verdict.reason.is_some());
//! # Ok(())
//! # }
//! ```
pub mod checker;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompts;
pub mod results;
pub mod traits;

use openai::OpenAiClient;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use traits::CompletionClient;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Everything needed to reach the completion provider.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the production client. Fails when the key is empty or the endpoint is not a URL.
pub fn connect(settings: &LlmSettings) -> quill_common::Result<Arc<dyn CompletionClient>> {
    let client = OpenAiClient::new(settings)?;
    tracing::info!(
        model=%settings.model,
        endpoint=%settings.endpoint,
        timeout_secs=settings.timeout.as_secs(),
        "llm.client.ready"
    );
    Ok(Arc::new(client))
}
