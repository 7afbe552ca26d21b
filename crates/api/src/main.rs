use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uacl_api::auth::password::Argon2Guard;
use uacl_api::config::ServerConfig;
use uacl_api::session::SessionOrchestrator;
use uacl_api::state::AppState;
use uacl_db::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uacl_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Credential store ---
    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(database_url) => {
            let pool = uacl_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            uacl_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            uacl_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgCredentialStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, credentials are held in memory only");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    // --- Sessions (loads signing keys once) ---
    let sessions = SessionOrchestrator::from_config(&config, store, Arc::new(Argon2Guard))
        .expect("Failed to load signing keys");
    tracing::info!(
        access_mins = config.jwt.access_token_expiry_mins,
        refresh_days = config.jwt.refresh_token_expiry_days,
        "Token issuer ready"
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(sessions),
    };

    let app = uacl_api::build_app(state).expect("Invalid CORS configuration");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let drain_limit = Duration::from_secs(config.shutdown_timeout_secs);

    // The drain timer only starts once a signal arrives; until then the
    // server future runs unbounded.
    let server = tokio::spawn(async move { server.await });
    tokio::select! {
        result = server => {
            result.expect("Server task panicked").expect("Server error");
        }
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(drain_limit).await;
        } => {
            tracing::warn!(?drain_limit, "In-flight requests did not drain in time");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
