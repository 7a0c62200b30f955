//! AI content verification: quality scoring, moderation and suggestions.
//!
//! Every operation builds a prompt, performs one completion call, parses the
//! reply and wraps it in a result record. Completion failures never escape:
//! each operation has an explicit fallback branch.
//!
//! | task            | max tokens | temperature | on failure                  |
//! |-----------------|-----------:|------------:|-----------------------------|
//! | quality         | 1000       | 0.3         | `success: false`, no score  |
//! | appropriateness | 200        | 0.1         | fail-open, appropriate      |
//! | suggestions     | 500        | 0.3         | canned text, `success:false`|

use crate::parser::{parse_appropriateness, parse_score};
use crate::prompts::{
    build_appropriateness_prompt, build_quality_prompt, build_suggestion_prompt,
    SuggestionAspect, COACH_SYSTEM_ROLE, MODERATION_SYSTEM_ROLE, QUALITY_SYSTEM_ROLE,
};
use crate::results::{AppropriatenessResult, SuggestionResult, VerificationResult};
use crate::traits::{CompletionClient, CompletionError, CompletionParams};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const QUALITY_PARAMS: CompletionParams = CompletionParams::new(1000, 0.3);
pub const MODERATION_PARAMS: CompletionParams = CompletionParams::new(200, 0.1);
pub const SUGGESTION_PARAMS: CompletionParams = CompletionParams::new(500, 0.3);

#[derive(Clone)]
pub struct ContentChecker {
    client: Arc<dyn CompletionClient>,
}

impl ContentChecker {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Score an article out of 10 and return the full analysis.
    pub async fn check_article_content(
        &self,
        title: &str,
        content: &str,
        excerpt: &str,
    ) -> VerificationResult {
        match self.score_article(title, content, excerpt).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    error=%err,
                    kind=err.kind(),
                    model=%self.model_name(),
                    "checker.quality.completion_failed"
                );
                VerificationResult::failed(&err)
            }
        }
    }

    /// Moderate a body of text. A failed call yields "appropriate".
    pub async fn check_inappropriate_content(&self, content: &str) -> AppropriatenessResult {
        match self.moderate(content).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    error=%err,
                    kind=err.kind(),
                    "checker.moderation.completion_failed.fail_open"
                );
                AppropriatenessResult::fail_open()
            }
        }
    }

    pub async fn suggest_improvements(
        &self,
        content: &str,
        aspect: SuggestionAspect,
    ) -> SuggestionResult {
        let prompt = build_suggestion_prompt(content, aspect);
        match self
            .client
            .complete(COACH_SYSTEM_ROLE, &prompt, SUGGESTION_PARAMS)
            .await
        {
            Ok(completion) => {
                info!(
                    aspect=aspect.as_str(),
                    reply_chars=completion.text.chars().count(),
                    "checker.suggestions.done"
                );
                SuggestionResult::generated(completion.text)
            }
            Err(err) => {
                warn!(
                    error=%err,
                    kind=err.kind(),
                    aspect=aspect.as_str(),
                    "checker.suggestions.completion_failed"
                );
                SuggestionResult::unavailable()
            }
        }
    }

    async fn score_article(
        &self,
        title: &str,
        content: &str,
        excerpt: &str,
    ) -> Result<VerificationResult, CompletionError> {
        let prompt = build_quality_prompt(title, content, excerpt);
        debug!(prompt_chars = prompt.chars().count(), "checker.quality.start");

        let completion = self
            .client
            .complete(QUALITY_SYSTEM_ROLE, &prompt, QUALITY_PARAMS)
            .await?;

        let score = parse_score(&completion.text);
        match score {
            Some(score) => info!(score, "checker.quality.done"),
            None => warn!(
                reply_chars = completion.text.chars().count(),
                "checker.parse.score_missing"
            ),
        }
        Ok(VerificationResult::scored(score, completion.text))
    }

    async fn moderate(&self, content: &str) -> Result<AppropriatenessResult, CompletionError> {
        let prompt = build_appropriateness_prompt(content);
        let completion = self
            .client
            .complete(MODERATION_SYSTEM_ROLE, &prompt, MODERATION_PARAMS)
            .await?;

        let verdict = parse_appropriateness(&completion.text);
        if verdict.appropriate && !completion.text.contains("APPROPRIATE:") {
            // Reply ignored the requested format; counted as appropriate.
            warn!(
                reply_chars = completion.text.chars().count(),
                "checker.parse.moderation_unrecognised"
            );
        }
        info!(appropriate = verdict.appropriate, "checker.moderation.done");
        Ok(verdict)
    }
}
