//! Shared domain types and pure logic for Noteally.
//!
//! This crate has no I/O: it holds the error taxonomy, id/timestamp
//! aliases, the note-content helpers (plain-text stripping, derived
//! titles and excerpts), and paging guards used by the repositories.

pub mod content;
pub mod error;
pub mod search;
pub mod types;
