pub mod auth;
pub mod autologin;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the gateway route tree.
///
/// Route hierarchy:
///
/// ```text
/// /public-key              public key PEM (public)
/// /authorize               identity behind a Bearer token
/// /refresh                 rotate a refresh token (public)
/// /login                   password login (public)
///
/// /users                   signup (public)
///
/// /autologin               mint autologin token (allow-listed Bearer)
/// /autologin/{token}       redeem autologin token (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/autologin", autologin::router())
}
