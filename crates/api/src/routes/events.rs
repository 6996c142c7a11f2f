//! Route definitions for the change feed.
//!
//! ```text
//! GET /events -> change_feed (SSE)
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(events::change_feed))
}
