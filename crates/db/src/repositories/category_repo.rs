//! Repository for the `categories` table.

use noteally_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, CreateCategory, UpdateCategory, DEFAULT_CATEGORY_COLOR};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, color, usage_count, created_at, updated_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category owned by `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let color = input.color.as_deref().unwrap_or(DEFAULT_CATEGORY_COLOR);
        let query = format!(
            "INSERT INTO categories (user_id, name, color)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(color)
            .fetch_one(pool)
            .await
    }

    /// Find a category by its ID, regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's categories in name order.
    pub async fn list_by_owner(pool: &PgPool, user_id: DbId) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE user_id = $1
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List a user's category names by descending usage, for suggestions.
    pub async fn suggestions(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM categories
             WHERE user_id = $1
             ORDER BY usage_count DESC, name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Update a category by ID, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Bump the usage counter for each of the given category names owned
    /// by the user. Names with no matching row are ignored.
    pub async fn increment_usage(
        pool: &PgPool,
        user_id: DbId,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        if names.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "UPDATE categories SET usage_count = usage_count + 1, updated_at = NOW()
             WHERE user_id = $1 AND name = ANY($2)",
        )
        .bind(user_id)
        .bind(names)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a category by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
