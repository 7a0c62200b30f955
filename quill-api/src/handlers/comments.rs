use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use quill_store::{Comment, NewComment};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct CommentParams {
    pub article: Option<i64>,
}

/// Approved comments, optionally for one article.
pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CommentParams>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.store.list_comments(params.article).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state.store.add_comment(input).await?;
    info!(user_id = user.id, comment_id = comment.id, "api.comments.create");
    Ok((StatusCode::CREATED, Json(comment)))
}
