//! Editing-session manager.
//!
//! [`SessionManager`] owns one actor task per open session, indexed by
//! session id. Created once at application startup; the returned `Arc`
//! can be cheaply cloned into request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use noteally_core::types::DbId;
use tokio::sync::{oneshot, RwLock};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::session::{spawn_session, Command, SessionHandle, SessionSnapshot};
use crate::store::{NoteStore, StoreError};

/// Default debounce delay between the last edit and the commit.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// How long to wait for a session task to drain on close/shutdown.
const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced to callers of the manager.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session with this id is open.
    #[error("Session {0} not found")]
    NotFound(Uuid),

    /// The session exists but belongs to another user.
    #[error("Session {0} belongs to another user")]
    Forbidden(Uuid),

    /// The session task has already exited.
    #[error("Session {0} is closed")]
    Closed(Uuid),

    /// The underlying store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages all open editing sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    store: Arc<dyn NoteStore>,
    debounce: Duration,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
}

impl SessionManager {
    /// Create a manager committing through `store` with the given
    /// debounce delay.
    pub fn new(store: Arc<dyn NoteStore>, debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            debounce,
            cancel: CancellationToken::new(),
        })
    }

    /// Open a session for `owner_id`, optionally bound to an existing
    /// note and seeded with initial content. Returns the initial
    /// snapshot; if a note id was given its content loads in the
    /// background and shows up in later snapshots.
    pub async fn open(
        &self,
        owner_id: DbId,
        note_id: Option<DbId>,
        initial_content: Option<String>,
    ) -> SessionSnapshot {
        let (handle, snapshot) = spawn_session(
            Arc::clone(&self.store),
            owner_id,
            note_id,
            initial_content,
            self.debounce,
            self.cancel.child_token(),
        );

        tracing::info!(
            session_id = %snapshot.session_id,
            owner_id,
            ?note_id,
            "editor session opened"
        );

        self.sessions
            .write()
            .await
            .insert(snapshot.session_id, handle);
        snapshot
    }

    /// Latest snapshot of a session. Never blocks on the actor, so a
    /// session mid-commit reports `saving`.
    pub async fn snapshot(
        &self,
        owner_id: DbId,
        session_id: Uuid,
    ) -> Result<SessionSnapshot, SessionError> {
        let sessions = self.sessions.read().await;
        let handle = Self::authorized(&sessions, owner_id, session_id)?;
        // Bind before returning so the watch::Ref drops ahead of the
        // read guard it borrows from.
        let snapshot = handle.snapshot_rx.borrow().clone();
        Ok(snapshot)
    }

    /// Replace the session's buffer; arms (or re-arms) the debounce.
    pub async fn update_content(
        &self,
        owner_id: DbId,
        session_id: Uuid,
        content: String,
    ) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(owner_id, session_id, Command::UpdateContent { content, reply })
            .await?;
        rx.await.map_err(|_| SessionError::Closed(session_id))
    }

    /// Commit immediately, bypassing the debounce. Used for the
    /// explicit "try again" action after a failed save.
    pub async fn save_now(
        &self,
        owner_id: DbId,
        session_id: Uuid,
    ) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(owner_id, session_id, Command::SaveNow { reply })
            .await?;
        rx.await.map_err(|_| SessionError::Closed(session_id))
    }

    /// Create a note from the session's buffer and bind the session to
    /// it. Subsequent edits flow through the normal debounce cycle.
    pub async fn create_note(
        &self,
        owner_id: DbId,
        session_id: Uuid,
        title: Option<String>,
    ) -> Result<DbId, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(owner_id, session_id, Command::CreateNote { title, reply })
            .await?;
        let note_id = rx.await.map_err(|_| SessionError::Closed(session_id))??;
        Ok(note_id)
    }

    /// Close a session. Cancels any pending debounce; an in-flight
    /// commit is allowed to finish.
    pub async fn close(&self, owner_id: DbId, session_id: Uuid) -> Result<(), SessionError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            Self::authorized(&sessions, owner_id, session_id)?;
            sessions
                .remove(&session_id)
                .ok_or(SessionError::NotFound(session_id))?
        };

        tracing::info!(session_id = %session_id, owner_id, "editor session closed");
        handle.cancel.cancel();
        let _ = tokio::time::timeout(TASK_DRAIN_TIMEOUT, handle.task).await;
        Ok(())
    }

    /// Close every session of `owner_id` that is editing `note_id`.
    ///
    /// Called when the note is deleted so sessions stop committing to a
    /// record that no longer exists.
    pub async fn close_for_note(&self, owner_id: DbId, note_id: DbId) {
        let matching: Vec<Uuid> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, h)| {
                    h.owner_id == owner_id && h.snapshot_rx.borrow().note_id == Some(note_id)
                })
                .map(|(id, _)| *id)
                .collect()
        };

        for session_id in matching {
            if let Err(e) = self.close(owner_id, session_id).await {
                tracing::warn!(session_id = %session_id, error = %e, "failed to close session for deleted note");
            }
        }
    }

    /// Gracefully shut down all session tasks.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down session manager");
        self.cancel.cancel();

        let mut sessions = self.sessions.write().await;
        for (session_id, handle) in sessions.drain() {
            tracing::debug!(session_id = %session_id, "stopping session task");
            let _ = tokio::time::timeout(TASK_DRAIN_TIMEOUT, handle.task).await;
        }

        tracing::info!("session manager shut down");
    }

    // ---- private helpers ----

    fn authorized<'a>(
        sessions: &'a HashMap<Uuid, SessionHandle>,
        owner_id: DbId,
        session_id: Uuid,
    ) -> Result<&'a SessionHandle, SessionError> {
        let handle = sessions
            .get(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        if handle.owner_id != owner_id {
            return Err(SessionError::Forbidden(session_id));
        }
        Ok(handle)
    }

    async fn send(
        &self,
        owner_id: DbId,
        session_id: Uuid,
        cmd: Command,
    ) -> Result<(), SessionError> {
        let tx = {
            let sessions = self.sessions.read().await;
            let handle = Self::authorized(&sessions, owner_id, session_id)?;
            handle.tx.clone()
        };
        tx.send(cmd)
            .await
            .map_err(|_| SessionError::Closed(session_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::session::SaveStatus;
    use crate::store::{NoteDraft, NotePatch, StoredNote};

    const OWNER: DbId = 1;

    /// In-memory store with injectable latency and failures.
    #[derive(Default)]
    struct MockStore {
        notes: Mutex<HashMap<DbId, StoredNote>>,
        next_id: AtomicI64,
        fail_updates: AtomicBool,
        load_delay_ms: AtomicU64,
        update_delay_ms: AtomicU64,
        update_count: AtomicUsize,
    }

    impl MockStore {
        fn seed(&self, owner_id: DbId, title: &str, content: &str) -> DbId {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.notes.lock().unwrap().insert(
                id,
                StoredNote {
                    id,
                    owner_id,
                    title: title.to_string(),
                    content: content.to_string(),
                    excerpt: String::new(),
                    updated_at: Utc::now(),
                },
            );
            id
        }

        fn stored(&self, id: DbId) -> StoredNote {
            self.notes.lock().unwrap().get(&id).cloned().unwrap()
        }

        fn updates(&self) -> usize {
            self.update_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl NoteStore for MockStore {
        async fn load(&self, owner_id: DbId, note_id: DbId) -> Result<StoredNote, StoreError> {
            let delay = self.load_delay_ms.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let notes = self.notes.lock().unwrap();
            let note = notes.get(&note_id).ok_or(StoreError::NotFound(note_id))?;
            if note.owner_id != owner_id {
                return Err(StoreError::Forbidden(note_id));
            }
            Ok(note.clone())
        }

        async fn create(&self, draft: NoteDraft) -> Result<StoredNote, StoreError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let note = StoredNote {
                id,
                owner_id: draft.owner_id,
                title: draft.title,
                content: draft.content,
                excerpt: draft.excerpt,
                updated_at: Utc::now(),
            };
            self.notes.lock().unwrap().insert(id, note.clone());
            Ok(note)
        }

        async fn update(
            &self,
            owner_id: DbId,
            note_id: DbId,
            patch: NotePatch,
        ) -> Result<StoredNote, StoreError> {
            let delay = self.update_delay_ms.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("injected failure".to_string()));
            }

            let mut notes = self.notes.lock().unwrap();
            let note = notes.get_mut(&note_id).ok_or(StoreError::NotFound(note_id))?;
            if note.owner_id != owner_id {
                return Err(StoreError::Forbidden(note_id));
            }
            if let Some(title) = patch.title {
                note.title = title;
            }
            if let Some(content) = patch.content {
                note.content = content;
            }
            if let Some(excerpt) = patch.excerpt {
                note.excerpt = excerpt;
            }
            note.updated_at = Utc::now();
            self.update_count.fetch_add(1, Ordering::SeqCst);
            Ok(note.clone())
        }
    }

    fn setup() -> (Arc<MockStore>, Arc<SessionManager>) {
        let store = Arc::new(MockStore::default());
        let manager = SessionManager::new(
            Arc::clone(&store) as Arc<dyn NoteStore>,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        );
        (store, manager)
    }

    /// Let spawned tasks run; auto-advances the paused clock slightly.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn open_without_note_starts_saved() {
        let (_, manager) = setup();
        let snap = manager.open(OWNER, None, None).await;
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(snap.note_id, None);
        assert!(snap.content.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn load_populates_buffer() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "Chapter 1", "original content");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;

        let snap = manager.snapshot(OWNER, snap.session_id).await.unwrap();
        assert_eq!(snap.content, "original content");
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(snap.note_id, Some(note_id));
        assert!(snap.last_saved_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_never_clobbers_edits() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "Chapter 1", "remote content");
        store.load_delay_ms.store(100, Ordering::SeqCst);

        let snap = manager.open(OWNER, Some(note_id), None).await;
        let session_id = snap.session_id;

        // Edit before the load resolves.
        manager
            .update_content(OWNER, session_id, "typed while loading".to_string())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        let snap = manager.snapshot(OWNER, session_id).await.unwrap();
        assert_eq!(snap.content, "typed while loading");
        // Metadata from the load is still recorded.
        assert!(snap.last_saved_at.is_some());
        assert_eq!(snap.status, SaveStatus::Unsaved);

        // The edit eventually commits against the loaded baseline.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.stored(note_id).content, "typed while loading");
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_commits_after_delay() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "Chapter 1", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;

        let snap = manager
            .update_content(OWNER, snap.session_id, "new content.".to_string())
            .await
            .unwrap();
        assert_eq!(snap.status, SaveStatus::Unsaved);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.updates(), 0, "must not commit before the delay");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.updates(), 1);
        assert_eq!(store.stored(note_id).content, "new content.");

        let snap = manager.snapshot(OWNER, snap.session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_commit() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        for (i, content) in ["draft one", "draft two", "draft three"].iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            manager
                .update_content(OWNER, session_id, content.to_string())
                .await
                .unwrap();
        }

        // 1.5s after the last edit: the replaced deadlines have not fired.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.updates(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.updates(), 1);
        assert_eq!(store.stored(note_id).content, "draft three");
    }

    #[tokio::test(start_paused = true)]
    async fn commit_failure_keeps_buffer_and_sets_error() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");
        store.fail_updates.store(true, Ordering::SeqCst);

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        manager
            .update_content(OWNER, session_id, "unsaved work".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;

        let snap = manager.snapshot(OWNER, session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Error);
        assert_eq!(snap.content, "unsaved work");
        assert!(snap.error.as_deref().unwrap().contains("injected failure"));
        assert_eq!(store.stored(note_id).content, "old");

        // Explicit retry succeeds once the store recovers.
        store.fail_updates.store(false, Ordering::SeqCst);
        let snap = manager.save_now(OWNER, session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(store.stored(note_id).content, "unsaved work");
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_bypasses_debounce() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        manager
            .update_content(OWNER, session_id, "immediate".to_string())
            .await
            .unwrap();
        let snap = manager.save_now(OWNER, session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(store.updates(), 1);

        // The debounce was disarmed; nothing further commits.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(store.updates(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn create_note_adopts_identity() {
        let (store, manager) = setup();

        let snap = manager
            .open(OWNER, None, Some("First sentence. More text.".to_string()))
            .await;
        let session_id = snap.session_id;

        let note_id = manager.create_note(OWNER, session_id, None).await.unwrap();
        let created = store.stored(note_id);
        assert_eq!(created.title, "First sentence");
        assert_eq!(created.content, "First sentence. More text.");

        // Subsequent edits flow through the normal debounce cycle.
        manager
            .update_content(OWNER, session_id, "First sentence. Edited.".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(store.stored(note_id).content, "First sentence. Edited.");
        assert_eq!(store.updates(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn untitled_note_gets_generated_title_on_commit() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "", "");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;

        manager
            .update_content(OWNER, snap.session_id, "Fresh ideas. And more.".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(store.stored(note_id).title, "Fresh ideas");
    }

    #[tokio::test(start_paused = true)]
    async fn existing_title_is_preserved_on_commit() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "My Title", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;

        manager
            .update_content(OWNER, snap.session_id, "Different opener. Body.".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(store.stored(note_id).title, "My Title");
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_during_commit_reports_saving() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");
        store.update_delay_ms.store(300, Ordering::SeqCst);

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        manager
            .update_content(OWNER, session_id, "slow save".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2050)).await;

        let snap = manager.snapshot(OWNER, session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saving);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let snap = manager.snapshot(OWNER, session_id).await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_during_commit_queue_until_it_resolves() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");
        store.update_delay_ms.store(300, Ordering::SeqCst);

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        manager
            .update_content(OWNER, session_id, "version one".to_string())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2050)).await;

        // Commit of "version one" is in flight; this edit queues behind it
        // and re-arms the debounce once the commit resolves.
        let snap = manager
            .update_content(OWNER, session_id, "version two".to_string())
            .await
            .unwrap();
        assert_eq!(snap.status, SaveStatus::Unsaved);
        assert_eq!(store.updates(), 1);
        assert_eq!(store.stored(note_id).content, "version one");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.updates(), 2);
        assert_eq!(store.stored(note_id).content, "version two");
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_debounce() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        let session_id = snap.session_id;

        manager
            .update_content(OWNER, session_id, "never saved".to_string())
            .await
            .unwrap();
        manager.close(OWNER, session_id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(store.updates(), 0);
        assert_eq!(store.stored(note_id).content, "old");

        assert!(matches!(
            manager.snapshot(OWNER, session_id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_owner_is_forbidden() {
        let (_, manager) = setup();
        let snap = manager.open(OWNER, None, None).await;

        assert!(matches!(
            manager.snapshot(OWNER + 1, snap.session_id).await,
            Err(SessionError::Forbidden(_))
        ));
        assert!(matches!(
            manager
                .update_content(OWNER + 1, snap.session_id, "x".to_string())
                .await,
            Err(SessionError::Forbidden(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_session_is_not_found() {
        let (_, manager) = setup();
        assert!(matches!(
            manager.snapshot(OWNER, Uuid::new_v4()).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn close_for_note_closes_matching_sessions() {
        let (store, manager) = setup();
        let note_a = store.seed(OWNER, "A", "a");
        let note_b = store.seed(OWNER, "B", "b");

        let s1 = manager.open(OWNER, Some(note_a), None).await;
        let s2 = manager.open(OWNER, Some(note_a), None).await;
        let s3 = manager.open(OWNER, Some(note_b), None).await;
        settle().await;

        manager.close_for_note(OWNER, note_a).await;

        assert!(manager.snapshot(OWNER, s1.session_id).await.is_err());
        assert!(manager.snapshot(OWNER, s2.session_id).await.is_err());
        assert!(manager.snapshot(OWNER, s3.session_id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_sessions() {
        let (store, manager) = setup();
        let note_id = store.seed(OWNER, "T", "old");

        let snap = manager.open(OWNER, Some(note_id), None).await;
        settle().await;
        manager
            .update_content(OWNER, snap.session_id, "doomed".to_string())
            .await
            .unwrap();

        manager.shutdown().await;

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(store.updates(), 0);
        assert!(manager.snapshot(OWNER, snap.session_id).await.is_err());
    }
}
