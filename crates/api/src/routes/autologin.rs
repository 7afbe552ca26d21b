//! Route definitions for the `/autologin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::autologin;
use crate::state::AppState;

/// Routes mounted at `/autologin`.
///
/// ```text
/// POST /          -> create (requires allow-listed auth)
/// GET  /{token}   -> redeem
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(autologin::create))
        .route("/{token}", get(autologin::redeem))
}
