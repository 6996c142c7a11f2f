//! Per-session actor: the auto-save state machine itself.
//!
//! One tokio task owns all mutable session state. Callers talk to it
//! through an mpsc command channel; the task publishes a fresh
//! [`SessionSnapshot`] on a watch channel after every state change, so
//! reads never block on the actor (a snapshot taken during a commit
//! shows `saving`).

use std::sync::Arc;

use noteally_core::content::{generate_excerpt, generate_title, UNTITLED};
use noteally_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::store::{NoteDraft, NotePatch, NoteStore, StoreError, StoredNote};

// ---------------------------------------------------------------------------
// Public state
// ---------------------------------------------------------------------------

/// Save state of an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Buffer matches the last committed content.
    Saved,
    /// Buffer has diverged; a commit is pending or blocked on identity.
    Unsaved,
    /// A commit is in flight.
    Saving,
    /// The last commit failed; the buffer is retained.
    Error,
}

/// Point-in-time view of a session, safe to hand to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub owner_id: DbId,
    pub note_id: Option<DbId>,
    pub content: String,
    pub status: SaveStatus,
    pub error: Option<String>,
    pub last_saved_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

/// Commands accepted by the session task.
pub(crate) enum Command {
    /// Replace the buffer with new content and (re)arm the debounce.
    UpdateContent {
        content: String,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Commit immediately, bypassing the debounce.
    SaveNow {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Create a note from the current buffer and adopt its id.
    CreateNote {
        title: Option<String>,
        reply: oneshot::Sender<Result<DbId, StoreError>>,
    },
}

/// Manager-side handle to a running session task.
pub(crate) struct SessionHandle {
    pub(crate) owner_id: DbId,
    pub(crate) tx: mpsc::Sender<Command>,
    pub(crate) snapshot_rx: watch::Receiver<SessionSnapshot>,
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

/// Command channel depth. Edits arriving faster than the actor drains
/// them apply backpressure to the caller.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Spawn a session task and return its handle plus the initial snapshot.
pub(crate) fn spawn_session(
    store: Arc<dyn NoteStore>,
    owner_id: DbId,
    note_id: Option<DbId>,
    initial_content: Option<String>,
    debounce: Duration,
    cancel: CancellationToken,
) -> (SessionHandle, SessionSnapshot) {
    let session_id = Uuid::new_v4();
    let buffer = initial_content.unwrap_or_default();

    let state = SessionState {
        session_id,
        owner_id,
        note_id,
        buffer: buffer.clone(),
        last_committed: buffer,
        title: None,
        status: SaveStatus::Saved,
        error: None,
        user_edited: false,
        last_saved_at: None,
    };

    let initial = state.snapshot();
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        tracing::debug!(session_id = %session_id, owner_id, ?note_id, "session task started");
        run_session(state, store, rx, snapshot_tx, debounce, task_cancel).await;
        tracing::debug!(session_id = %session_id, "session task exited");
    });

    let handle = SessionHandle {
        owner_id,
        tx,
        snapshot_rx,
        cancel,
        task,
    };
    (handle, initial)
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct SessionState {
    session_id: Uuid,
    owner_id: DbId,
    note_id: Option<DbId>,
    /// What the user currently sees.
    buffer: String,
    /// Content as last written to (or read from) the store.
    last_committed: String,
    /// Title the stored note currently carries, once known.
    title: Option<String>,
    status: SaveStatus,
    error: Option<String>,
    /// Set on the first buffer update; a remote load never replaces the
    /// buffer once this is set.
    user_edited: bool,
    last_saved_at: Option<Timestamp>,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            owner_id: self.owner_id,
            note_id: self.note_id,
            content: self.buffer.clone(),
            status: self.status,
            error: self.error.clone(),
            last_saved_at: self.last_saved_at,
        }
    }

    fn dirty(&self) -> bool {
        self.buffer != self.last_committed
    }

    /// Whether the stored note still needs a title derived from content.
    fn needs_title(&self) -> bool {
        match self.title.as_deref() {
            None => true,
            Some(t) => t.is_empty() || t == UNTITLED,
        }
    }

    fn adopt_committed(&mut self, note: &StoredNote) {
        self.note_id = Some(note.id);
        self.title = Some(note.title.clone());
        self.last_saved_at = Some(note.updated_at);
    }
}

async fn run_session(
    mut state: SessionState,
    store: Arc<dyn NoteStore>,
    mut rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    // Remote load runs concurrently with command processing so early
    // keystrokes are never blocked on the fetch.
    let mut load: Option<JoinHandle<Result<StoredNote, StoreError>>> = state.note_id.map(|id| {
        let store = Arc::clone(&store);
        let owner_id = state.owner_id;
        tokio::spawn(async move { store.load(owner_id, id).await })
    });

    let mut deadline: Option<Instant> = None;

    loop {
        let load_pending = load.is_some();
        let debounce_armed = deadline.is_some();

        tokio::select! {
            _ = cancel.cancelled() => break,

            loaded = async { load.as_mut().expect("guarded by load_pending").await },
                if load_pending =>
            {
                load = None;
                apply_load(&mut state, loaded, &mut deadline, debounce);
            }

            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if debounce_armed =>
            {
                deadline = None;
                if state.dirty() && state.note_id.is_some() {
                    commit(&mut state, store.as_ref(), &snapshot_tx).await;
                }
            }

            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                handle_command(&mut state, cmd, store.as_ref(), &snapshot_tx, &mut deadline, debounce)
                    .await;
            }
        }

        let _ = snapshot_tx.send(state.snapshot());
    }
}

fn apply_load(
    state: &mut SessionState,
    loaded: Result<Result<StoredNote, StoreError>, tokio::task::JoinError>,
    deadline: &mut Option<Instant>,
    debounce: Duration,
) {
    let result = match loaded {
        Ok(result) => result,
        Err(join_err) => Err(StoreError::Backend(join_err.to_string())),
    };

    match result {
        Ok(note) => {
            if state.user_edited {
                // Never clobber keystrokes. Record the note's metadata
                // and treat the remote content as the committed
                // baseline; the pending edit commits against it.
                state.last_committed = note.content.clone();
                state.adopt_committed(&note);
                if state.dirty() {
                    state.status = SaveStatus::Unsaved;
                    *deadline = Some(Instant::now() + debounce);
                }
            } else {
                state.buffer = note.content.clone();
                state.last_committed = note.content.clone();
                state.adopt_committed(&note);
                state.status = SaveStatus::Saved;
            }
        }
        Err(e) => {
            tracing::warn!(session_id = %state.session_id, error = %e, "note load failed");
            state.status = SaveStatus::Error;
            state.error = Some(e.to_string());
        }
    }
}

async fn handle_command(
    state: &mut SessionState,
    cmd: Command,
    store: &dyn NoteStore,
    snapshot_tx: &watch::Sender<SessionSnapshot>,
    deadline: &mut Option<Instant>,
    debounce: Duration,
) {
    match cmd {
        Command::UpdateContent { content, reply } => {
            state.buffer = content;
            state.user_edited = true;
            state.error = None;

            if state.dirty() {
                state.status = SaveStatus::Unsaved;
                // Cancel-and-replace: each edit pushes the deadline out.
                if state.note_id.is_some() {
                    *deadline = Some(Instant::now() + debounce);
                }
            } else {
                state.status = SaveStatus::Saved;
                *deadline = None;
            }

            let _ = reply.send(state.snapshot());
        }

        Command::SaveNow { reply } => {
            *deadline = None;
            if state.dirty() && state.note_id.is_some() {
                commit(state, store, snapshot_tx).await;
            }
            let _ = reply.send(state.snapshot());
        }

        Command::CreateNote { title, reply } => {
            *deadline = None;
            let result = create_note(state, title, store, snapshot_tx).await;
            let _ = reply.send(result);
        }
    }
}

/// Commit the buffer to the store. Runs inline in the actor task, so no
/// other command or debounce fire can interleave with it.
async fn commit(
    state: &mut SessionState,
    store: &dyn NoteStore,
    snapshot_tx: &watch::Sender<SessionSnapshot>,
) {
    let Some(note_id) = state.note_id else { return };

    state.status = SaveStatus::Saving;
    let _ = snapshot_tx.send(state.snapshot());

    let patch = NotePatch {
        title: state.needs_title().then(|| generate_title(&state.buffer)),
        content: Some(state.buffer.clone()),
        excerpt: Some(generate_excerpt(&state.buffer)),
    };

    match store.update(state.owner_id, note_id, patch).await {
        Ok(note) => {
            state.last_committed = state.buffer.clone();
            state.adopt_committed(&note);
            state.status = SaveStatus::Saved;
            state.error = None;
            tracing::debug!(session_id = %state.session_id, note_id, "auto-save committed");
        }
        Err(e) => {
            // Keep the buffer; the user retries explicitly or by editing.
            tracing::warn!(session_id = %state.session_id, note_id, error = %e, "auto-save failed");
            state.status = SaveStatus::Error;
            state.error = Some(e.to_string());
        }
    }
}

/// Create a note from the buffer and adopt its identity.
async fn create_note(
    state: &mut SessionState,
    title: Option<String>,
    store: &dyn NoteStore,
    snapshot_tx: &watch::Sender<SessionSnapshot>,
) -> Result<DbId, StoreError> {
    state.status = SaveStatus::Saving;
    let _ = snapshot_tx.send(state.snapshot());

    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| generate_title(&state.buffer));

    let draft = NoteDraft {
        owner_id: state.owner_id,
        title,
        content: state.buffer.clone(),
        excerpt: generate_excerpt(&state.buffer),
    };

    match store.create(draft).await {
        Ok(note) => {
            state.last_committed = state.buffer.clone();
            state.adopt_committed(&note);
            state.status = SaveStatus::Saved;
            state.error = None;
            tracing::info!(session_id = %state.session_id, note_id = note.id, "note created from session");
            Ok(note.id)
        }
        Err(e) => {
            state.status = SaveStatus::Error;
            state.error = Some(e.to_string());
            Err(e)
        }
    }
}
