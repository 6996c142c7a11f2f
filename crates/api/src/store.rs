//! Database-backed [`NoteStore`] used by the auto-save session manager.
//!
//! Commits land in the `notes` table through [`NoteRepo`] and publish a
//! [`ChangeEvent`] so subscribed clients see auto-saved changes the same
//! way they see explicit API mutations.

use std::sync::Arc;

use async_trait::async_trait;
use noteally_autosave::{NoteDraft, NotePatch, NoteStore, StoreError, StoredNote};
use noteally_core::types::DbId;
use noteally_db::models::note::{CreateNote, Note, UpdateNote};
use noteally_db::repositories::NoteRepo;
use noteally_db::DbPool;
use noteally_events::{Action, ChangeEvent, Collection, EventBus};

pub struct DbNoteStore {
    pool: DbPool,
    event_bus: Arc<EventBus>,
}

impl DbNoteStore {
    pub fn new(pool: DbPool, event_bus: Arc<EventBus>) -> Self {
        Self { pool, event_bus }
    }
}

fn to_stored(note: Note) -> StoredNote {
    StoredNote {
        id: note.id,
        owner_id: note.user_id,
        title: note.title,
        content: note.content,
        excerpt: note.excerpt,
        updated_at: note.updated_at,
    }
}

fn backend_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl NoteStore for DbNoteStore {
    async fn load(&self, owner_id: DbId, note_id: DbId) -> Result<StoredNote, StoreError> {
        let note = NoteRepo::find_by_id(&self.pool, note_id)
            .await
            .map_err(backend_err)?
            .ok_or(StoreError::NotFound(note_id))?;
        if note.user_id != owner_id {
            return Err(StoreError::Forbidden(note_id));
        }
        Ok(to_stored(note))
    }

    async fn create(&self, draft: NoteDraft) -> Result<StoredNote, StoreError> {
        let input = CreateNote {
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            ..Default::default()
        };
        let note = NoteRepo::create(&self.pool, draft.owner_id, &input)
            .await
            .map_err(backend_err)?;

        self.event_bus.publish(ChangeEvent::new(
            Collection::Notes,
            Action::Created,
            note.user_id,
            note.id,
        ));
        Ok(to_stored(note))
    }

    async fn update(
        &self,
        owner_id: DbId,
        note_id: DbId,
        patch: NotePatch,
    ) -> Result<StoredNote, StoreError> {
        // Ownership check before touching the row.
        let existing = NoteRepo::find_by_id(&self.pool, note_id)
            .await
            .map_err(backend_err)?
            .ok_or(StoreError::NotFound(note_id))?;
        if existing.user_id != owner_id {
            return Err(StoreError::Forbidden(note_id));
        }

        let input = UpdateNote {
            title: patch.title,
            content: patch.content,
            excerpt: patch.excerpt,
            ..Default::default()
        };
        let note = NoteRepo::update(&self.pool, note_id, &input)
            .await
            .map_err(backend_err)?
            .ok_or(StoreError::NotFound(note_id))?;

        self.event_bus.publish(ChangeEvent::new(
            Collection::Notes,
            Action::Updated,
            note.user_id,
            note.id,
        ));
        Ok(to_stored(note))
    }
}
