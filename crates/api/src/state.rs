use std::sync::Arc;

use noteally_autosave::SessionManager;
use noteally_events::EventBus;
use noteally_pipeline::GenerativeClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: noteally_db::DbPool,
    /// Server configuration (JWT secret, timeouts, debounce delay).
    pub config: Arc<ServerConfig>,
    /// Centralized change-event bus.
    pub event_bus: Arc<EventBus>,
    /// Auto-save editing-session manager.
    pub sessions: Arc<SessionManager>,
    /// Client for the hosted generative-model pipelines (OCR, enrichment).
    pub pipeline: Arc<GenerativeClient>,
}
