//! Storage seam for the auto-save state machine.

use async_trait::async_trait;
use noteally_core::types::{DbId, Timestamp};

/// A note as seen by the auto-save layer.
///
/// Only the fields the state machine needs; the full record lives in the
/// database layer.
#[derive(Debug, Clone)]
pub struct StoredNote {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub updated_at: Timestamp,
}

/// Fields for creating a note from an editing session.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub owner_id: DbId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

/// Partial update applied by a commit. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
}

/// Errors a [`NoteStore`] can surface to the state machine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No note with this id exists.
    #[error("Note {0} not found")]
    NotFound(DbId),

    /// The note exists but belongs to another user.
    #[error("Note {0} is owned by another user")]
    Forbidden(DbId),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Owner-scoped note storage used by editing sessions.
///
/// Implementations must enforce ownership: `load` and `update` fail with
/// [`StoreError::Forbidden`] when `owner_id` does not match the stored
/// record's owner.
#[async_trait]
pub trait NoteStore: Send + Sync + 'static {
    /// Fetch a note the owner is allowed to edit.
    async fn load(&self, owner_id: DbId, note_id: DbId) -> Result<StoredNote, StoreError>;

    /// Create a new note and return the stored record.
    async fn create(&self, draft: NoteDraft) -> Result<StoredNote, StoreError>;

    /// Apply a partial update and return the record as stored.
    async fn update(
        &self,
        owner_id: DbId,
        note_id: DbId,
        patch: NotePatch,
    ) -> Result<StoredNote, StoreError>;
}
