use std::sync::Arc;

use crate::config::ServerConfig;
use crate::session::SessionOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, loaded once at startup.
    pub config: Arc<ServerConfig>,
    /// Login, signup, refresh and autologin logic.
    pub sessions: Arc<SessionOrchestrator>,
}
