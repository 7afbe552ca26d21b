//! Route definitions for token and login endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// GET  /public-key  -> public_key
/// GET  /authorize   -> authorize (requires auth)
/// POST /refresh     -> refresh
/// POST /login       -> login
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/public-key", get(auth::public_key))
        .route("/authorize", get(auth::authorize))
        .route("/refresh", post(auth::refresh))
        .route("/login", post(auth::login))
}
