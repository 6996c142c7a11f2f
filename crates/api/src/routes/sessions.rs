//! Route definitions for editor sessions (auto-save).
//!
//! ```text
//! POST   /               -> open_session
//! GET    /{id}           -> get_session
//! PUT    /{id}/content   -> update_content
//! POST   /{id}/save      -> save_session
//! POST   /{id}/note      -> create_note_from_session
//! DELETE /{id}           -> close_session
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::open_session))
        .route(
            "/{id}",
            get(sessions::get_session).delete(sessions::close_session),
        )
        .route("/{id}/content", put(sessions::update_content))
        .route("/{id}/save", post(sessions::save_session))
        .route("/{id}/note", post(sessions::create_note_from_session))
}
