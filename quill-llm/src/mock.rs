//! Scripted completion client for tests and offline runs.

use crate::traits::{Completion, CompletionClient, CompletionError, CompletionParams};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

pub const MOCK_MODEL: &str = "scripted-mock";

/// One prompt as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_role: String,
    pub user_prompt: String,
    pub params: CompletionParams,
}

enum Script {
    Reply(String),
    Fail(fn() -> CompletionError),
}

/// Answers every call with the same reply, or the same failure, and records
/// each prompt it receives.
pub struct ScriptedClient {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make_error: fn() -> CompletionError) -> Self {
        Self {
            script: Script::Fail(make_error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.recorded().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.recorded().last().cloned()
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.recorded().clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        system_role: &str,
        user_prompt: &str,
        params: CompletionParams,
    ) -> Result<Completion, CompletionError> {
        self.recorded().push(RecordedCall {
            system_role: system_role.to_string(),
            user_prompt: user_prompt.to_string(),
            params,
        });
        match &self.script {
            Script::Reply(text) => Ok(Completion {
                text: text.clone(),
                model: Some(MOCK_MODEL.to_string()),
                tokens_used: None,
            }),
            Script::Fail(make_error) => Err(make_error()),
        }
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}
