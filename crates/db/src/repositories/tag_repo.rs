//! Repository for the `tags` table.

use noteally_core::types::DbId;
use sqlx::PgPool;

use crate::models::tag::{CreateTag, Tag, UpdateTag, DEFAULT_TAG_COLOR};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, color, usage_count, created_at, updated_at";

/// Provides CRUD operations for tags.
pub struct TagRepo;

impl TagRepo {
    /// Insert a new tag owned by `user_id`, returning the created row.
    ///
    /// Violating the per-user name uniqueness constraint surfaces as a
    /// database error carrying the `uq_tags_user_id_name` constraint.
    pub async fn create(pool: &PgPool, user_id: DbId, input: &CreateTag) -> Result<Tag, sqlx::Error> {
        let color = input.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR);
        let query = format!(
            "INSERT INTO tags (user_id, name, color)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(color)
            .fetch_one(pool)
            .await
    }

    /// Find a tag by its ID, regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's tags in name order.
    pub async fn list_by_owner(pool: &PgPool, user_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags
             WHERE user_id = $1
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List a user's tag names by descending usage, for suggestion chips.
    pub async fn suggestions(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM tags
             WHERE user_id = $1
             ORDER BY usage_count DESC, name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Update a tag by ID, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Bump the usage counter for each of the given tag names owned by
    /// the user. Names with no matching tag row are ignored.
    pub async fn increment_usage(
        pool: &PgPool,
        user_id: DbId,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        if names.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "UPDATE tags SET usage_count = usage_count + 1, updated_at = NOW()
             WHERE user_id = $1 AND name = ANY($2)",
        )
        .bind(user_id)
        .bind(names)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a tag by ID. Returns `true` if a row was deleted.
    ///
    /// Notes referencing the tag name keep it; there is no retraction.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
