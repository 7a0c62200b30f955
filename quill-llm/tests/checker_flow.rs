//! ContentChecker wired to a real HTTP client and a mocked provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use quill_llm::checker::ContentChecker;
use quill_llm::prompts::SuggestionAspect;
use quill_llm::results::SUGGESTIONS_UNAVAILABLE;
use quill_llm::{connect, LlmSettings};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checker_for(server: &MockServer) -> ContentChecker {
    let settings = LlmSettings {
        api_key: "sk-test".into(),
        model: "gpt-3.5-turbo".into(),
        endpoint: server.uri(),
        timeout: Duration::from_secs(5),
    };
    ContentChecker::new(connect(&settings).expect("client"))
}

fn reply(text: &str) -> serde_json::Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

#[tokio::test]
async fn quality_check_end_to_end() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Titre: Rust et SQLite"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply("Analyse\nSCORE: 8.5/10\nDétails")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = checker_for(&server)
        .check_article_content("Rust et SQLite", "Un article.", "Résumé")
        .await;

    assert!(result.success);
    assert_eq!(result.score, Some(8.5));
    assert_eq!(result.feedback, "Analyse\nSCORE: 8.5/10\nDétails");
}

#[tokio::test]
async fn provider_outage_degrades_every_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(3)
        .mount(&server)
        .await;

    let checker = Arc::new(checker_for(&server));

    let quality = checker.check_article_content("T", "C", "").await;
    assert!(!quality.success && !quality.checked);
    assert!(quality.feedback.starts_with("Erreur lors de la vérification: "));

    let moderation = checker.check_inappropriate_content("texte").await;
    assert!(moderation.appropriate);
    assert!(moderation.reason.is_none());

    let suggestions = checker
        .suggest_improvements("texte", SuggestionAspect::General)
        .await;
    assert!(!suggestions.success);
    assert_eq!(suggestions.suggestions, SUGGESTIONS_UNAVAILABLE);
}

#[cfg(feature = "e2e")]
#[tokio::test]
#[ignore]
async fn live_moderation_smoketest() {
    common::init_test_tracing();
    let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
        tracing::debug!("Skipping: OPENAI_API_KEY not set");
        return;
    };
    let settings = LlmSettings {
        api_key,
        model: quill_llm::DEFAULT_OPENAI_MODEL.into(),
        endpoint: quill_llm::DEFAULT_OPENAI_ENDPOINT.into(),
        timeout: Duration::from_secs(60),
    };
    let checker = ContentChecker::new(connect(&settings).expect("client"));
    let verdict = checker
        .check_inappropriate_content("Une recette de tarte aux pommes.")
        .await;
    assert!(verdict.appropriate);
}
