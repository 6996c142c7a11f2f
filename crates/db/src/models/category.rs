//! Category entity model and DTOs.

use noteally_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default chip color for new categories.
pub const DEFAULT_CATEGORY_COLOR: &str = "#8B5CF6";

/// A row from the `categories` table. Category names are unique per user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub color: String,
    pub usage_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new category.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub color: Option<String>,
}

/// DTO for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
}
