use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use quill_store::{Category, Tag};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.store.list_categories(params.search.as_deref()).await?))
}

pub async fn category(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.store.category_by_slug(&slug).await?))
}

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.store.list_tags(params.search.as_deref()).await?))
}

pub async fn tag(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.store.tag_by_slug(&slug).await?))
}
