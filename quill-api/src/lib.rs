//! HTTP surface of Quill: the blog API and the AI review endpoints.
//!
//! [`create_app`] builds the axum [`Router`]; every handler receives the
//! shared [`AppState`] and answers JSON. Errors are rendered by [`ApiError`]
//! as `{"error": "..."}` bodies.
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod extract;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        // AI review
        .route("/api/ai/check-article/", post(handlers::ai::check_article))
        .route("/api/ai/check-appropriate/", post(handlers::ai::check_appropriate))
        .route("/api/ai/suggest-improvements/", post(handlers::ai::suggest_improvements))
        // articles
        .route(
            "/api/articles/",
            get(handlers::articles::list).post(handlers::articles::create),
        )
        .route("/api/articles/my_articles/", get(handlers::articles::my_articles))
        .route("/api/articles/drafts/", get(handlers::articles::drafts))
        .route("/api/articles/search/", post(handlers::articles::search))
        .route(
            "/api/articles/:id/",
            get(handlers::articles::retrieve)
                .put(handlers::articles::update)
                .delete(handlers::articles::destroy),
        )
        .route("/api/articles/:id/publish/", post(handlers::articles::publish))
        .route(
            "/api/articles/:id/check_with_ai/",
            post(handlers::articles::check_with_ai),
        )
        // taxonomy
        .route("/api/categories/", get(handlers::catalog::list_categories))
        .route("/api/categories/:slug/", get(handlers::catalog::category))
        .route("/api/tags/", get(handlers::catalog::list_tags))
        .route("/api/tags/:slug/", get(handlers::catalog::tag))
        // comments and accounts
        .route(
            "/api/comments/",
            get(handlers::comments::list).post(handlers::comments::create),
        )
        .route("/api/auth/profile/", get(handlers::profile))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState};
    pub use quill_llm::checker::ContentChecker;
    pub use quill_store::Store;
}
