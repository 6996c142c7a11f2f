//! Handlers for the generative-model pipelines (OCR, enrichment).
//!
//! These two endpoints follow the external interface contract rather
//! than the standard `{ "data": ... }` envelope: camelCase bodies,
//! `{ "success": true, "data": ... }` on success, `{ "error" }` with
//! 400 for rejected input, and `{ "error", "details" }` with 500 for
//! pipeline failures.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use noteally_pipeline::{enrich_note, extract_text, EnrichRequest, OcrRequest, PipelineError};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /notes/enrich`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichBody {
    #[serde(default)]
    pub content: String,
    pub current_title: Option<String>,
    #[serde(default)]
    pub current_tags: Vec<String>,
    #[serde(default)]
    pub current_categories: Vec<String>,
}

/// Request body for `POST /ocr`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrBody {
    #[serde(default)]
    pub image_data: String,
    pub prompt: Option<String>,
}

/// Success payload for `POST /notes/enrich`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichPayload {
    pub title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub confidence: f64,
    pub summary: String,
    pub processing_time: u64,
}

/// Success payload for `POST /ocr`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPayload {
    pub extracted_text: String,
    pub confidence: f64,
    pub processing_time: u64,
}

/// Pipeline failure mapped to the contract's error envelope.
pub struct PipelineFailure {
    error: PipelineError,
    /// Caller-facing description of what failed.
    context: &'static str,
}

impl IntoResponse for PipelineFailure {
    fn into_response(self) -> Response {
        match self.error {
            PipelineError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            other => {
                tracing::error!(error = %other, "pipeline call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": self.context,
                        "details": other.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

fn success<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/notes/enrich
///
/// Suggest a title, tags, categories, and a summary for note content.
pub async fn enrich(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<EnrichBody>,
) -> Result<Response, PipelineFailure> {
    let request = EnrichRequest {
        content: body.content,
        current_title: body.current_title,
        current_tags: body.current_tags,
        current_categories: body.current_categories,
    };

    let enrichment = enrich_note(&state.pipeline, &request)
        .await
        .map_err(|error| PipelineFailure {
            error,
            context: "Failed to enrich note content",
        })?;

    Ok(success(EnrichPayload {
        title: enrichment.title,
        tags: enrichment.tags,
        categories: enrichment.categories,
        confidence: enrichment.confidence,
        summary: enrichment.summary,
        processing_time: enrichment.processing_time_ms,
    }))
}

/// POST /api/v1/ocr
///
/// Extract text from a base64-encoded page photograph.
pub async fn ocr(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<OcrBody>,
) -> Result<Response, PipelineFailure> {
    let request = OcrRequest {
        image_data: body.image_data,
        prompt: body.prompt,
    };

    let result = extract_text(&state.pipeline, &request)
        .await
        .map_err(|error| PipelineFailure {
            error,
            context: "Failed to extract text from image",
        })?;

    Ok(success(OcrPayload {
        extracted_text: result.extracted_text,
        confidence: result.confidence,
        processing_time: result.processing_time_ms,
    }))
}
