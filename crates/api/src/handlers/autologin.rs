//! Handlers for the `/autologin` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uacl_core::requests::AutologinRequest;
use uacl_db::models::token::TokenPair;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::session::AutologinGrant;
use crate::state::AppState;

/// POST /autologin
///
/// Allow-listed callers only. The allow-list is checked before the body is
/// looked at, so an unauthorized caller never learns about body errors.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    body: Result<Json<AutologinRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AutologinGrant>)> {
    state.sessions.ensure_autologin_creator(&caller)?;
    let Json(input) = body?;

    let grant = state.sessions.create_autologin(&caller, input).await?;
    tracing::info!(caller = %caller.username, target = %grant.username, "Issued autologin token");
    Ok((StatusCode::CREATED, Json(grant)))
}

/// GET /autologin/{token}
///
/// Spend a single-use token and return a session for its user.
pub async fn redeem(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let pair = state.sessions.redeem_autologin(&token).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}
