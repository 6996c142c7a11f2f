//! Route definitions for authentication.
//!
//! ```text
//! POST /register   -> register
//! POST /login      -> login
//! POST /anonymous  -> anonymous
//! POST /refresh    -> refresh
//! POST /logout     -> logout
//! GET  /me         -> me
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/anonymous", post(auth::anonymous))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
