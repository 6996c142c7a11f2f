//! Server-sent events feed of the caller's record changes.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/events
///
/// SSE stream of the authenticated user's own change events, one SSE
/// event per [`noteally_events::ChangeEvent`], named by its dotted
/// event type (e.g. `notes.deleted`). Events for other owners are
/// filtered out; lagged receivers silently skip the overwritten
/// entries.
pub async fn change_feed(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let owner_id = auth.user_id;
    let rx = state.event_bus.subscribe();

    tracing::debug!(user_id = owner_id, "change feed subscribed");

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        futures::future::ready(match result {
            Ok(event) if event.owner_id == owner_id => {
                let data = serde_json::to_string(&event).unwrap_or_default();
                Some(Ok(Event::default().event(event.event_type()).data(data)))
            }
            _ => None,
        })
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
