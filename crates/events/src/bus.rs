//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ChangeEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use noteally_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// The record collection an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Notes,
    Tags,
    Categories,
}

impl Collection {
    /// Dot-notation name used in event-type strings, e.g. `"notes"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Notes => "notes",
            Collection::Tags => "tags",
            Collection::Categories => "categories",
        }
    }
}

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        }
    }
}

/// A record change that occurred in one of the owner-scoped collections.
///
/// Published by the API handlers (and by auto-save commits) after every
/// successful mutation, so subscribed clients can update their local
/// lists without refetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Collection the changed record belongs to.
    pub collection: Collection,

    /// What happened to the record.
    pub action: Action,

    /// Id of the user owning the record; used to filter fan-out.
    pub owner_id: DbId,

    /// Database id of the changed record.
    pub entity_id: DbId,

    /// When the change was observed (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event stamped with the current time.
    pub fn new(collection: Collection, action: Action, owner_id: DbId, entity_id: DbId) -> Self {
        Self {
            collection,
            action,
            owner_id,
            entity_id,
            timestamp: Utc::now(),
        }
    }

    /// Dot-separated event name, e.g. `"notes.deleted"`.
    pub fn event_type(&self) -> String {
        format!("{}.{}", self.collection.as_str(), self.action.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ChangeEvent`]. Slow receivers
/// observe `RecvError::Lagged` when the buffer wraps.
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ChangeEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    ///
    /// Dropping the returned receiver ends the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ChangeEvent::new(Collection::Notes, Action::Created, 7, 42));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type(), "notes.created");
        assert_eq!(received.owner_id, 7);
        assert_eq!(received.entity_id, 42);
    }

    #[tokio::test]
    async fn all_subscribers_receive_every_event() {
        let bus = EventBus::default();
        let mut rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();

        bus.publish(ChangeEvent::new(Collection::Tags, Action::Deleted, 1, 2));

        assert_eq!(rx_a.recv().await.unwrap().event_type(), "tags.deleted");
        assert_eq!(rx_b.recv().await.unwrap().event_type(), "tags.deleted");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        // Must not panic or error.
        bus.publish(ChangeEvent::new(
            Collection::Categories,
            Action::Updated,
            1,
            1,
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_receiving() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        drop(rx);

        // A fresh subscriber only sees events published after it joined.
        bus.publish(ChangeEvent::new(Collection::Notes, Action::Deleted, 3, 9));
        let mut rx2 = bus.subscribe();
        bus.publish(ChangeEvent::new(Collection::Notes, Action::Created, 3, 10));

        let received = rx2.recv().await.unwrap();
        assert_eq!(received.entity_id, 10);
    }
}
