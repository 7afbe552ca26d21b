//! Handlers for the `/users` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uacl_core::requests::CreateUserRequest;
use uacl_db::models::token::TokenPair;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /users
///
/// Register a user and return their first token pair.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let Json(input) = body?;
    let pair = state.sessions.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}
