use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use uacl_api::auth::jwt::JwtConfig;
use uacl_api::auth::password::PasswordGuard;
use uacl_api::config::{AutologinConfig, ServerConfig};
use uacl_api::session::SessionOrchestrator;
use uacl_api::state::AppState;
use uacl_db::InMemoryCredentialStore;

pub const AUTOLOGIN_SITE: &str = "https://app.test";

/// Reversible stand-in for Argon2 so HTTP tests stay fast in debug builds.
pub struct PlainGuard;

impl PasswordGuard for PlainGuard {
    fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or(argon2::password_hash::Error::PhcStringField)
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Build a test `ServerConfig` pointing at the fixture key pair.
pub fn test_config(allowed_creators: &[&str]) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
        jwt: JwtConfig {
            private_key_path: fixture("private.pem"),
            public_key_path: fixture("public.pem"),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        autologin: AutologinConfig {
            allowed_creators: allowed_creators.iter().map(|s| s.to_string()).collect(),
            site: AUTOLOGIN_SITE.to_string(),
        },
    }
}

/// Build the full application router over a fresh in-memory store.
pub fn build_test_app(allowed_creators: &[&str]) -> Router {
    let config = test_config(allowed_creators);
    let sessions = SessionOrchestrator::from_config(
        &config,
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(PlainGuard),
    )
    .expect("fixture keys should load");

    let state = AppState {
        config: Arc::new(config),
        sessions: Arc::new(sessions),
    };
    uacl_api::build_app(state).expect("test CORS origins are valid")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and return the issued token pair.
pub async fn signup(app: Router, name: &str, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "name": name, "username": username, "password": password });
    let response = post_json(app, "/users", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
