//! Route composition for the API.

pub mod auth;
pub mod categories;
pub mod events;
pub mod health;
pub mod notes;
pub mod pipeline;
pub mod sessions;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/notes", notes::router())
        .nest("/tags", tags::router())
        .nest("/categories", categories::router())
        .nest("/editor/sessions", sessions::router())
        .merge(pipeline::router())
        .merge(events::router())
}
