//! Handlers for key discovery, token checks, login and refresh.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uacl_core::identity::ShortenedUser;
use uacl_core::requests::{LoginRequest, RefreshRequest};
use uacl_db::models::token::TokenPair;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response body of `GET /public-key`.
#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    /// PEM text of the key that verifies every issued token.
    pub key: String,
}

/// GET /public-key
pub async fn public_key(State(state): State<AppState>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        key: state.sessions.public_key().to_string(),
    })
}

/// GET /authorize
///
/// Echo the identity behind the Bearer token.
pub async fn authorize(AuthUser(user): AuthUser) -> Json<ShortenedUser> {
    tracing::info!(username = %user.username, "Validated token");
    Json(user)
}

/// POST /refresh
///
/// Exchange the current refresh token for a new pair. The old refresh token
/// stops working.
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let Json(input) = body?;
    let pair = state.sessions.refresh(input).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let Json(input) = body?;
    let pair = state.sessions.login(input).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}
