//! Per-connection heartbeat/timeout loop expressed as an SSE event stream.
//!
//! The stream is a two-state machine: it runs until the connection is
//! closed and never re-enters. On entry it emits an initial keep-alive
//! comment and a debug notification confirming the stream is live, then
//! pumps the delivery channel. Idle timeouts become comment heartbeats so
//! intermediaries do not tear the connection down.
//!
//! A [`ConnectionGuard`] inside the stream state unregisters the
//! connection exactly once on every exit route, including the client
//! disconnecting and axum dropping the body stream mid-pull.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::Event;
use futures_util::stream::{unfold, Stream};
use serde_json::json;
use tracing::{debug, info};

use super::registry::{ConnectionId, ConnectionRegistry, DeliveryReceiver, PullOutcome};

struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
        info!(
            connection = self.id,
            active = self.registry.len(),
            "sse connection closed"
        );
    }
}

enum Phase {
    Hello,
    Announce,
    Pump,
}

struct PumpState {
    phase: Phase,
    receiver: DeliveryReceiver,
    heartbeat: Duration,
    guard: ConnectionGuard,
}

/// Register a connection and return its SSE event stream.
///
/// The stream yields `data:` events for delivered frames and comment
/// events as heartbeats, and terminates when the connection is closed.
pub fn event_stream(
    registry: Arc<ConnectionRegistry>,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let (id, receiver) = registry.register();
    info!(
        connection = id,
        active = registry.len(),
        "sse connection opened"
    );

    let state = PumpState {
        phase: Phase::Hello,
        receiver,
        heartbeat,
        guard: ConnectionGuard { registry, id },
    };

    unfold(state, |mut state| async move {
        match state.phase {
            Phase::Hello => {
                state.phase = Phase::Announce;
                Some((Ok(Event::default().comment("")), state))
            }
            Phase::Announce => {
                state.phase = Phase::Pump;
                let frame = json!({
                    "jsonrpc": "2.0",
                    "method": "notifications/debug",
                    "params": { "message": "SSE connection established" }
                })
                .to_string();
                Some((Ok(Event::default().data(frame)), state))
            }
            Phase::Pump => match state.receiver.pull(state.heartbeat).await {
                PullOutcome::Frame(frame) => {
                    debug!(connection = state.guard.id, "emitting frame");
                    Some((Ok(Event::default().data(frame.as_ref())), state))
                }
                PullOutcome::TimedOut => {
                    debug!(connection = state.guard.id, "idle; emitting heartbeat");
                    Some((Ok(Event::default().comment("")), state))
                }
                PullOutcome::Closed => None,
            },
        }
    })
}
