//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod categories;
pub mod events;
pub mod notes;
pub mod pipelines;
pub mod sessions;
pub mod tags;
