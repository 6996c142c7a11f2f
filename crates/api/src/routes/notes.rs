//! Route definitions for notes.
//!
//! ```text
//! POST   /          -> create_note
//! GET    /          -> list_notes
//! GET    /search    -> search_notes
//! POST   /enrich    -> pipelines::enrich
//! GET    /{id}      -> get_note
//! PUT    /{id}      -> update_note
//! DELETE /{id}      -> delete_note
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{notes, pipelines};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(notes::create_note).get(notes::list_notes))
        .route("/search", get(notes::search_notes))
        .route("/enrich", post(pipelines::enrich))
        .route(
            "/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
}
