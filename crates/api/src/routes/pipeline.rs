//! Route definitions for the OCR pipeline.
//!
//! The enrichment endpoint lives under `/notes/enrich` (see
//! `routes::notes`); only OCR is mounted here.
//!
//! ```text
//! POST /ocr -> pipelines::ocr
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::pipelines;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ocr", post(pipelines::ocr))
}
