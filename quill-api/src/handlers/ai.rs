//! Stateless AI review endpoints. Input is validated before any provider
//! call is made.

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use quill_llm::prompts::SuggestionAspect;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Absent keys and explicit `null`s both read as empty text.
#[derive(Debug, Default, Deserialize)]
pub struct CheckArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentRequest {
    pub content: Option<String>,
    pub aspect: Option<String>,
}

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

type Reply = (StatusCode, Json<Value>);

pub async fn check_article(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CheckArticleRequest>,
) -> Result<Reply, ApiError> {
    let (title, content) = (text(&req.title), text(&req.content));
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Le titre et le contenu sont requis".into(),
        ));
    }

    let result = state
        .checker
        .check_article_content(title, content, text(&req.excerpt))
        .await;
    info!(
        user_id = user.id,
        success = result.success,
        score = ?result.score,
        "api.ai.check_article"
    );

    let (status, message) = if result.success {
        (StatusCode::OK, "Contenu vérifié avec succès")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Erreur lors de la vérification")
    };
    Ok((status, Json(json!({ "message": message, "data": result }))))
}

pub async fn check_appropriate(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Reply, ApiError> {
    let content = text(&req.content);
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Le contenu est requis".into()));
    }

    let verdict = state.checker.check_inappropriate_content(content).await;
    info!(
        user_id = user.id,
        appropriate = verdict.appropriate,
        "api.ai.check_appropriate"
    );
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Contenu vérifié", "data": verdict })),
    ))
}

pub async fn suggest_improvements(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Reply, ApiError> {
    let content = text(&req.content);
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Le contenu est requis".into()));
    }

    let aspect = req
        .aspect
        .as_deref()
        .map(SuggestionAspect::from_name)
        .unwrap_or_default();
    let result = state.checker.suggest_improvements(content, aspect).await;
    info!(
        user_id = user.id,
        aspect = aspect.as_str(),
        success = result.success,
        "api.ai.suggest_improvements"
    );

    let (status, message) = if result.success {
        (StatusCode::OK, "Suggestions générées avec succès")
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Erreur lors de la génération des suggestions",
        )
    };
    Ok((status, Json(json!({ "message": message, "data": result }))))
}
