//! Article endpoints. Writes are limited to the author or staff.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser, MaybeUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use quill_store::{
    Article, ArticleDetail, ArticleFilter, ArticleStatus, ArticleSummary, ArticleUpdate,
    NewArticle, SearchQuery, User, Visibility,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

fn can_edit(user: &User, article: &Article) -> bool {
    user.is_staff || article.author.id == user.id
}

/// Drafts are only visible to their author and to staff.
fn can_view(user: Option<&User>, article: &Article) -> bool {
    article.is_published() || user.is_some_and(|u| can_edit(u, article))
}

fn summaries(articles: Vec<Article>) -> Json<Vec<ArticleSummary>> {
    Json(articles.into_iter().map(ArticleSummary::from).collect())
}

async fn editable(state: &AppState, user: &User, id: i64) -> Result<Article, ApiError> {
    let article = state.store.article_by_id(id).await?;
    if !can_edit(user, &article) {
        warn!(article_id = id, user_id = user.id, "api.articles.permission_denied");
        return Err(ApiError::Forbidden);
    }
    Ok(article)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(mut filter): ApiQuery<ArticleFilter>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    filter.visibility = Visibility::for_user(user.as_ref());
    let articles = state.store.list_articles(&filter).await?;
    Ok(summaries(articles))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewArticle>,
) -> Result<(StatusCode, Json<ArticleDetail>), ApiError> {
    let article = state.store.create_article(&user, input).await?;
    let detail = state.store.article_detail(article.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let detail = state.store.article_detail(id).await?;
    if !can_view(user.as_ref(), &detail.article) {
        return Err(ApiError::NotFound(format!("article {id} introuvable")));
    }
    Ok(Json(detail))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<ArticleUpdate>,
) -> Result<Json<ArticleDetail>, ApiError> {
    editable(&state, &user, id).await?;
    state.store.update_article(id, changes).await?;
    Ok(Json(state.store.article_detail(id).await?))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    editable(&state, &user, id).await?;
    state.store.delete_article(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_articles(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    Ok(summaries(state.store.articles_by_author(user.id, None).await?))
}

pub async fn drafts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    Ok(summaries(
        state
            .store
            .articles_by_author(user.id, Some(ArticleStatus::Draft))
            .await?,
    ))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiJson(mut query): ApiJson<SearchQuery>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    query.published_only = user.is_none();
    Ok(summaries(state.store.search_articles(&query).await?))
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    editable(&state, &user, id).await?;
    state.store.publish_article(id).await?;
    let detail = state.store.article_detail(id).await?;
    Ok(Json(json!({
        "message": "Article publié avec succès",
        "article": detail,
    })))
}

/// Run the quality review on a stored article. Only a successful review is
/// written back; a failed one leaves the article untouched.
pub async fn check_with_ai(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let article = editable(&state, &user, id).await?;

    let result = state
        .checker
        .check_article_content(&article.title, &article.content, &article.excerpt)
        .await;

    if !result.success {
        warn!(article_id = id, "api.articles.check_with_ai.failed");
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Erreur lors de la vérification IA",
                "ai_result": result,
            })),
        ));
    }

    state
        .store
        .record_ai_review(id, result.score, &result.feedback)
        .await?;
    let detail = state.store.article_detail(id).await?;
    info!(article_id = id, score = ?result.score, "api.articles.check_with_ai.done");
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Article vérifié avec l'IA",
            "ai_result": result,
            "article": detail,
        })),
    ))
}
