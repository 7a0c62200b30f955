use crate::extract::AuthUser;
use axum::Json;
use quill_store::User;
use serde_json::{json, Value};

pub mod ai;
pub mod articles;
pub mod catalog;
pub mod comments;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The authenticated caller.
pub async fn profile(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
