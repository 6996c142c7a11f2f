//! Handlers for the `/editor/sessions` resource.
//!
//! These endpoints drive the auto-save state machine in
//! `noteally_autosave`: open a session (optionally bound to a note),
//! push buffer updates, trigger explicit saves, create a note from the
//! buffer, and close the session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use noteally_autosave::SessionSnapshot;
use noteally_core::content::MAX_NOTE_CONTENT_LENGTH;
use noteally_core::error::CoreError;
use noteally_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /editor/sessions`.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Existing note to edit; its content loads in the background.
    pub note_id: Option<DbId>,
    /// Initial buffer content for a fresh (note-less) session.
    pub content: Option<String>,
}

/// Request body for `PUT /editor/sessions/{id}/content`.
#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

/// Request body for `POST /editor/sessions/{id}/note`.
#[derive(Debug, Deserialize)]
pub struct CreateNoteFromSessionRequest {
    pub title: Option<String>,
}

/// Response body for `POST /editor/sessions/{id}/note`.
#[derive(Debug, Serialize)]
pub struct CreatedNoteResponse {
    pub note_id: DbId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions
///
/// Open an editing session. Returns the initial snapshot; when a note
/// id was supplied, the remote content shows up in later snapshots.
pub async fn open_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<OpenSessionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionSnapshot>>)> {
    let snapshot = state
        .sessions
        .open(auth.user_id, input.note_id, input.content)
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

/// GET /api/v1/editor/sessions/{id}
///
/// Latest snapshot of the session, including its save status.
pub async fn get_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.snapshot(auth.user_id, session_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// PUT /api/v1/editor/sessions/{id}/content
///
/// Replace the session buffer. Arms (or re-arms) the debounce; the
/// commit happens in the background once the delay elapses.
pub async fn update_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(input): Json<UpdateContentRequest>,
) -> AppResult<impl IntoResponse> {
    // An empty buffer is legal mid-edit; only the length cap applies.
    if input.content.len() > MAX_NOTE_CONTENT_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Note content exceeds maximum length of {MAX_NOTE_CONTENT_LENGTH} characters"
        ))));
    }

    let snapshot = state
        .sessions
        .update_content(auth.user_id, session_id, input.content)
        .await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/editor/sessions/{id}/save
///
/// Commit immediately, bypassing the debounce. Used to retry after a
/// failed auto-save.
pub async fn save_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.save_now(auth.user_id, session_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/editor/sessions/{id}/note
///
/// Create a note from the session buffer and bind the session to it.
pub async fn create_note_from_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(input): Json<CreateNoteFromSessionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedNoteResponse>>)> {
    let note_id = state
        .sessions
        .create_note(auth.user_id, session_id, input.title)
        .await?;

    tracing::info!(
        note_id,
        session_id = %session_id,
        user_id = auth.user_id,
        "note created from editor session"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedNoteResponse { note_id },
        }),
    ))
}

/// DELETE /api/v1/editor/sessions/{id}
///
/// Close the session. A pending debounce is cancelled; an in-flight
/// commit is allowed to finish.
pub async fn close_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.close(auth.user_id, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
