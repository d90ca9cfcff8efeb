use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use taskweave_supervisor::{Supervisor, UpdateEvent};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

fn to_sse_event(update: &UpdateEvent) -> Event {
    Event::default()
        .event(update.event_name())
        .data(update.payload().to_string())
}

/// `GET /events`: named server-sent events `tasks`, `agents`, `stats`.
///
/// A full task snapshot is sent on connect; afterwards the stream relays
/// supervisor broadcasts. Slow subscribers are best-effort: lagged
/// broadcast slots are skipped with a warning, never an error to the
/// client.
pub async fn events_handler(
    State(supervisor): State<Supervisor>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("SSE subscriber connected");
    let receiver = supervisor.subscribe();
    let tasks = supervisor.list().await;

    let snapshot = stream::once(async move {
        Ok(Event::default()
            .event("tasks")
            .data(serde_json::to_string(&tasks).unwrap_or_else(|_| "[]".to_string())))
    });

    let updates = BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(update) => Some(Ok(to_sse_event(&update))),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "SSE subscriber lagged; dropping events");
                None
            }
        }
    });

    Sse::new(snapshot.chain(updates)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_update_event_mapping() {
        let update = UpdateEvent::Agents {
            agents: HashMap::new(),
        };
        // Event is opaque; the mapping must at least not panic and the
        // payload must be valid JSON.
        let _ = to_sse_event(&update);
        assert!(update.payload().is_object());
    }
}
