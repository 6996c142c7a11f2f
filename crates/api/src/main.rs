use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noteally_api::config::ServerConfig;
use noteally_api::router::build_app_router;
use noteally_api::state::AppState;
use noteally_api::store::DbNoteStore;
use noteally_autosave::SessionManager;
use noteally_pipeline::{GenerativeClient, PipelineConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noteally_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = noteally_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    noteally_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    noteally_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(noteally_events::EventBus::default());
    tracing::info!("Event bus created");

    // --- Auto-save session manager ---
    let store = Arc::new(DbNoteStore::new(pool.clone(), Arc::clone(&event_bus)));
    let sessions = SessionManager::new(store, Duration::from_millis(config.autosave_delay_ms));
    tracing::info!(
        debounce_ms = config.autosave_delay_ms,
        "Auto-save session manager started"
    );

    // --- Generative pipeline client ---
    let pipeline = Arc::new(GenerativeClient::new(PipelineConfig::from_env()));
    tracing::info!("Generative pipeline client configured");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        sessions: Arc::clone(&sessions),
        pipeline,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Flush editing sessions first so pending edits are committed,
    // bounded by the configured shutdown window.
    let shutdown_window = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_window, sessions.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "session manager did not drain within the shutdown window"
        );
    }
    tracing::info!("Session manager shut down");

    // The router (and its state) is gone once `serve` returns; dropping
    // the session manager releases the note store's bus handle, so this
    // last drop closes the broadcast channel and ends any change-feed
    // streams.
    drop(sessions);
    drop(event_bus);
    tracing::info!("Event bus closed");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
