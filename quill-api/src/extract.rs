//! Request extractors: bearer-token authentication, plus JSON bodies, query
//! strings and path segments whose rejections render as `{"error"}` bodies.

use crate::error::{ApiError, AUTH_REQUIRED, INVALID_TOKEN};
use crate::state::AppState;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use quill_store::User;
use std::sync::Arc;
use tracing::debug;

/// Caller that must be authenticated.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Caller that may be anonymous. A token that is present but unknown is
/// still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// `axum::Json` whose rejection renders as a 400 `{"error"}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Token from `Authorization: Bearer <t>` (or `Token <t>`).
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(raw) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = raw
        .to_str()
        .map_err(|_| ApiError::Unauthorized(INVALID_TOKEN))?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(ApiError::Unauthorized(INVALID_TOKEN))?;
    if !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")) {
        return Err(ApiError::Unauthorized(INVALID_TOKEN));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_TOKEN));
    }
    Ok(Some(token))
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };
    match state.store.user_by_token(token).await? {
        Some(user) => {
            debug!(user_id = user.id, "api.auth.ok");
            Ok(Some(user))
        }
        None => Err(ApiError::Unauthorized(INVALID_TOKEN)),
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized(AUTH_REQUIRED))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}
