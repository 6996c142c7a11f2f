//! Tag entity model and DTOs.

use noteally_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default chip color for new tags.
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

/// A row from the `tags` table. Tag names are unique per user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub color: String,
    pub usage_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new tag.
#[derive(Debug, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub color: Option<String>,
}

/// DTO for updating a tag.
#[derive(Debug, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
}
