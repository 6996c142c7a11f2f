//! Repository for the `notes` table.

use noteally_core::types::DbId;
use sqlx::PgPool;

use crate::models::note::{CreateNote, Note, UpdateNote};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, content, excerpt, tags, categories, \
    extracted_text, original_image, ocr_confidence, created_at, updated_at";

/// Provides CRUD operations for notes.
pub struct NoteRepo;

impl NoteRepo {
    /// Insert a new note owned by `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateNote,
    ) -> Result<Note, sqlx::Error> {
        let query = format!(
            "INSERT INTO notes
                (user_id, title, content, excerpt, tags, categories,
                 extracted_text, original_image, ocr_confidence)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(&input.categories)
            .bind(&input.extracted_text)
            .bind(&input.original_image)
            .bind(input.ocr_confidence)
            .fetch_one(pool)
            .await
    }

    /// Find a note by its ID, regardless of owner.
    ///
    /// The caller is responsible for comparing `note.user_id` with the
    /// requesting user so an owner mismatch can be reported as Forbidden.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's notes, most recently updated first.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes
             WHERE user_id = $1
             ORDER BY updated_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Fetch a user's entire note list, most recently updated first.
    ///
    /// Used by substring search, which filters in process after retrieval.
    pub async fn list_all_by_owner(pool: &PgPool, user_id: DbId) -> Result<Vec<Note>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes
             WHERE user_id = $1
             ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a note by ID, returning the updated row.
    ///
    /// Only non-`None` fields in `input` are applied; `updated_at` is
    /// always refreshed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNote,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!(
            "UPDATE notes SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                excerpt = COALESCE($4, excerpt),
                tags = COALESCE($5, tags),
                categories = COALESCE($6, categories),
                extracted_text = COALESCE($7, extracted_text),
                original_image = COALESCE($8, original_image),
                ocr_confidence = COALESCE($9, ocr_confidence),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(&input.categories)
            .bind(&input.extracted_text)
            .bind(&input.original_image)
            .bind(input.ocr_confidence)
            .fetch_optional(pool)
            .await
    }

    /// Delete a note by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
