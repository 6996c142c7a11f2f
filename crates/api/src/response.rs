//! Shared response envelope types for API handlers.
//!
//! All standard API responses use a `{ "data": ... }` envelope. Use
//! [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`
//! to get compile-time type safety and consistent serialization. The
//! OCR and enrichment endpoints use their own `{ "success": ..., "data": ... }`
//! envelope defined in `handlers::pipelines`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
