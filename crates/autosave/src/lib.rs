//! Auto-save synchronization for note editing sessions.
//!
//! Each open editor session is a small state machine with four save
//! states (`saved`, `unsaved`, `saving`, `error`) driven by a dedicated
//! tokio task. Content edits arm a debounce timer (cancel-and-replace);
//! when it fires, the buffer is committed through the [`NoteStore`]
//! trait. Commits run inline inside the session task, so a commit and a
//! debounce fire can never overlap: commands arriving while a commit is
//! in flight queue up and are processed once it resolves.
//!
//! [`SessionManager`] owns the session tasks and is the only public
//! entry point. Storage is abstracted behind [`NoteStore`] so the state
//! machine can be tested against an in-memory store with paused time.

pub mod manager;
pub mod session;
pub mod store;

pub use manager::{SessionError, SessionManager};
pub use session::{SaveStatus, SessionSnapshot};
pub use store::{NoteDraft, NotePatch, NoteStore, StoreError, StoredNote};
