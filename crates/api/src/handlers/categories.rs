//! Handlers for the `/categories` resource.
//!
//! Mirrors the tag endpoints: owner-scoped, per-user unique names,
//! usage counters, no referential integrity to notes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use noteally_core::error::CoreError;
use noteally_core::types::DbId;
use noteally_db::models::category::{Category, CreateCategory, UpdateCategory};
use noteally_db::repositories::CategoryRepo;
use noteally_events::{Action, ChangeEvent, Collection};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/categories
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Category name cannot be empty".into(),
        )));
    }

    let category = CategoryRepo::create(&state.pool, auth.user_id, &input).await?;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Categories,
        Action::Created,
        auth.user_id,
        category.id,
    ));

    tracing::info!(
        category_id = category.id,
        user_id = auth.user_id,
        "category created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// GET /api/v1/categories
///
/// List the caller's categories in name order.
pub async fn list_categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/suggestions
///
/// Category names ordered by usage count, most used first.
pub async fn category_suggestions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let names = CategoryRepo::suggestions(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: names }))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    find_owned_category(&state, auth.user_id, category_id).await?;

    let category = CategoryRepo::update(&state.pool, category_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }))?;

    state.event_bus.publish(ChangeEvent::new(
        Collection::Categories,
        Action::Updated,
        auth.user_id,
        category.id,
    ));

    tracing::info!(category_id, user_id = auth.user_id, "category updated");

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_category(&state, auth.user_id, category_id).await?;

    let deleted = CategoryRepo::delete(&state.pool, category_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }));
    }

    state.event_bus.publish(ChangeEvent::new(
        Collection::Categories,
        Action::Deleted,
        auth.user_id,
        category_id,
    ));

    tracing::info!(category_id, user_id = auth.user_id, "category deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch a category and enforce ownership: 404 when absent, 403 otherwise.
async fn find_owned_category(
    state: &AppState,
    user_id: DbId,
    category_id: DbId,
) -> AppResult<Category> {
    let category = CategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }))?;

    if category.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Category is owned by another user".into(),
        )));
    }

    Ok(category)
}
