//! Handlers for the `/tags` resource.
//!
//! Tags are owner-scoped labels with a color and a usage counter. Names
//! are unique per user (violations surface as 409). Deleting a tag does
//! not retract its name from notes that reference it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use noteally_core::error::CoreError;
use noteally_core::types::DbId;
use noteally_db::models::tag::{CreateTag, Tag, UpdateTag};
use noteally_db::repositories::TagRepo;
use noteally_events::{Action, ChangeEvent, Collection};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/tags
pub async fn create_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Tag name cannot be empty".into(),
        )));
    }

    let tag = TagRepo::create(&state.pool, auth.user_id, &input).await?;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Tags,
        Action::Created,
        auth.user_id,
        tag.id,
    ));

    tracing::info!(tag_id = tag.id, user_id = auth.user_id, "tag created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// GET /api/v1/tags
///
/// List the caller's tags in name order.
pub async fn list_tags(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tags = TagRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// GET /api/v1/tags/suggestions
///
/// Tag names ordered by usage count, most used first.
pub async fn tag_suggestions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let names = TagRepo::suggestions(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: names }))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    find_owned_tag(&state, auth.user_id, tag_id).await?;

    let tag = TagRepo::update(&state.pool, tag_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        }))?;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Tags,
        Action::Updated,
        auth.user_id,
        tag.id,
    ));

    tracing::info!(tag_id, user_id = auth.user_id, "tag updated");

    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_tag(&state, auth.user_id, tag_id).await?;

    let deleted = TagRepo::delete(&state.pool, tag_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        }));
    }

    state.event_bus.publish(ChangeEvent::new(
        Collection::Tags,
        Action::Deleted,
        auth.user_id,
        tag_id,
    ));

    tracing::info!(tag_id, user_id = auth.user_id, "tag deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch a tag and enforce ownership: 404 when absent, 403 otherwise.
async fn find_owned_tag(state: &AppState, user_id: DbId, tag_id: DbId) -> AppResult<Tag> {
    let tag = TagRepo::find_by_id(&state.pool, tag_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        }))?;

    if tag.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Tag is owned by another user".into(),
        )));
    }

    Ok(tag)
}
