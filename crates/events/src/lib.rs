//! Change-event infrastructure for Noteally.
//!
//! Provides the in-process publish/subscribe hub that replaces the
//! callback-based store subscriptions of the original design:
//!
//! - [`EventBus`] -- fan-out hub backed by `tokio::sync::broadcast`.
//! - [`ChangeEvent`] -- the canonical record-change envelope.
//!
//! Subscribing returns a receiver; dropping the receiver is the
//! unsubscribe. Consumers own their subscription lifetime.

pub mod bus;

pub use bus::{Action, ChangeEvent, Collection, EventBus};
