//! Route definitions for tags.
//!
//! ```text
//! POST   /              -> create_tag
//! GET    /              -> list_tags
//! GET    /suggestions   -> tag_suggestions
//! PUT    /{id}          -> update_tag
//! DELETE /{id}          -> delete_tag
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tags::create_tag).get(tags::list_tags))
        .route("/suggestions", get(tags::tag_suggestions))
        .route("/{id}", put(tags::update_tag).delete(tags::delete_tag))
}
