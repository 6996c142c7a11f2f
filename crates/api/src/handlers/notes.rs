//! Handlers for the `/notes` resource: CRUD, substring search, and
//! usage-counter maintenance for tag/category names.
//!
//! All records are owner-scoped: a note whose stored owner differs from
//! the caller is rejected with 403, a missing note with 404.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use noteally_core::content::{generate_excerpt, generate_title, validate_note_content};
use noteally_core::error::CoreError;
use noteally_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use noteally_core::types::DbId;
use noteally_db::models::note::{CreateNote, Note, UpdateNote};
use noteally_db::repositories::{CategoryRepo, NoteRepo, TagRepo};
use noteally_events::{Action, ChangeEvent, Collection};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /notes`.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub extracted_text: Option<String>,
    pub original_image: Option<String>,
    pub ocr_confidence: Option<f64>,
}

/// Query parameters for `GET /notes`.
#[derive(Debug, Deserialize)]
pub struct ListNotesParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /notes/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/notes
///
/// Create a note. Title and excerpt are derived from the content when
/// not supplied. Tag and category usage counters are bumped.
pub async fn create_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNoteRequest>,
) -> AppResult<impl IntoResponse> {
    validate_note_content(&input.content)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let title = input
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| generate_title(&input.content));
    let excerpt = generate_excerpt(&input.content);

    let create = CreateNote {
        title,
        content: input.content,
        excerpt,
        tags: input.tags,
        categories: input.categories,
        extracted_text: input.extracted_text,
        original_image: input.original_image,
        ocr_confidence: input.ocr_confidence,
    };
    let note = NoteRepo::create(&state.pool, auth.user_id, &create).await?;

    TagRepo::increment_usage(&state.pool, auth.user_id, &note.tags).await?;
    CategoryRepo::increment_usage(&state.pool, auth.user_id, &note.categories).await?;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Notes,
        Action::Created,
        auth.user_id,
        note.id,
    ));

    tracing::info!(note_id = note.id, user_id = auth.user_id, "note created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: note })))
}

/// GET /api/v1/notes
///
/// List the caller's notes, most recently updated first.
pub async fn list_notes(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListNotesParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let notes = NoteRepo::list_by_owner(&state.pool, auth.user_id, limit, offset).await?;

    Ok(Json(DataResponse { data: notes }))
}

/// GET /api/v1/notes/search?q=term
///
/// Case-insensitive substring search across title, content, excerpt,
/// extracted OCR text, and tag/category names. Filters the owner's full
/// note list in process; fine for per-user corpora, not an index.
pub async fn search_notes(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let term = params.q.trim();
    let notes = NoteRepo::list_all_by_owner(&state.pool, auth.user_id).await?;

    let matches: Vec<Note> = if term.is_empty() {
        notes
    } else {
        notes.into_iter().filter(|n| n.matches_term(term)).collect()
    };

    Ok(Json(DataResponse { data: matches }))
}

/// GET /api/v1/notes/{id}
pub async fn get_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let note = find_owned_note(&state, auth.user_id, note_id).await?;
    Ok(Json(DataResponse { data: note }))
}

/// PUT /api/v1/notes/{id}
///
/// Partial update. When content changes and no excerpt is supplied, the
/// excerpt is re-derived. Usage counters are bumped for tag/category
/// names when the sets change.
pub async fn update_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
    Json(mut input): Json<UpdateNote>,
) -> AppResult<impl IntoResponse> {
    let existing = find_owned_note(&state, auth.user_id, note_id).await?;

    if let Some(content) = input.content.as_deref() {
        validate_note_content(content)
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
        if input.excerpt.is_none() {
            input.excerpt = Some(generate_excerpt(content));
        }
    }

    let tags_changed = input
        .tags
        .as_ref()
        .is_some_and(|tags| *tags != existing.tags);
    let categories_changed = input
        .categories
        .as_ref()
        .is_some_and(|cats| *cats != existing.categories);

    let note = NoteRepo::update(&state.pool, note_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Note",
            id: note_id,
        }))?;

    if tags_changed {
        TagRepo::increment_usage(&state.pool, auth.user_id, &note.tags).await?;
    }
    if categories_changed {
        CategoryRepo::increment_usage(&state.pool, auth.user_id, &note.categories).await?;
    }

    state.event_bus.publish(ChangeEvent::new(
        Collection::Notes,
        Action::Updated,
        auth.user_id,
        note.id,
    ));

    tracing::info!(note_id, user_id = auth.user_id, "note updated");

    Ok(Json(DataResponse { data: note }))
}

/// DELETE /api/v1/notes/{id}
///
/// Hard delete. Open editor sessions for the note are closed first and
/// the change event is published before the response, so clients can
/// drop the note from their lists immediately.
pub async fn delete_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_note(&state, auth.user_id, note_id).await?;

    state.sessions.close_for_note(auth.user_id, note_id).await;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Notes,
        Action::Deleted,
        auth.user_id,
        note_id,
    ));

    let deleted = NoteRepo::delete(&state.pool, note_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Note",
            id: note_id,
        }));
    }

    tracing::info!(note_id, user_id = auth.user_id, "note deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a note and enforce ownership: 404 when absent, 403 when owned
/// by someone else.
async fn find_owned_note(state: &AppState, user_id: DbId, note_id: DbId) -> AppResult<Note> {
    let note = NoteRepo::find_by_id(&state.pool, note_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Note",
            id: note_id,
        }))?;

    if note.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Note is owned by another user".into(),
        )));
    }

    Ok(note)
}
