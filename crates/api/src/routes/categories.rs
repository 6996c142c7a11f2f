//! Route definitions for categories.
//!
//! ```text
//! POST   /              -> create_category
//! GET    /              -> list_categories
//! GET    /suggestions   -> category_suggestions
//! PUT    /{id}          -> update_category
//! DELETE /{id}          -> delete_category
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(categories::create_category).get(categories::list_categories),
        )
        .route("/suggestions", get(categories::category_suggestions))
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
}
