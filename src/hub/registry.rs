//! Connection registry with per-connection delivery channels.
//!
//! The registry owns every live push connection: a monotonically increasing
//! identity, a bounded FIFO queue of serialized frames, and a cancellation
//! token acting as the close signal. It is the only shared mutable
//! structure in the hub; registration and removal are serialized against
//! broadcast iteration by the internal mutex, while traffic on different
//! connections' queues never contends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::rpc::message::Outbound;

/// Identity assigned to a connection at registration. Never reused.
pub type ConnectionId = u64;

/// One element of a delivery queue: a serialized frame or the close sentinel.
#[derive(Debug, Clone)]
enum QueueItem {
    Frame(Arc<str>),
    Close,
}

/// Result of pulling from a delivery channel with a timeout.
#[derive(Debug, Clone)]
pub enum PullOutcome {
    /// A serialized frame ready to emit on the transport.
    Frame(Arc<str>),
    /// The timeout elapsed with no traffic; emit a keep-alive.
    TimedOut,
    /// The connection was closed; the consumer must stop pulling.
    Closed,
}

struct ConnectionEntry {
    queue: mpsc::Sender<QueueItem>,
    closing: CancellationToken,
}

/// Consumer half of a delivery channel, held by the connection's stream.
pub struct DeliveryReceiver {
    queue: mpsc::Receiver<QueueItem>,
    closing: CancellationToken,
}

impl DeliveryReceiver {
    /// Block until a frame arrives, the timeout elapses, or the connection
    /// is closed.
    pub async fn pull(&mut self, timeout: Duration) -> PullOutcome {
        tokio::select! {
            () = self.closing.cancelled() => PullOutcome::Closed,
            item = self.queue.recv() => match item {
                Some(QueueItem::Frame(frame)) => PullOutcome::Frame(frame),
                Some(QueueItem::Close) | None => PullOutcome::Closed,
            },
            () = tokio::time::sleep(timeout) => PullOutcome::TimedOut,
        }
    }
}

/// Tracks live push connections and their delivery queues.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    queue_capacity: usize,
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry with the given per-connection queue capacity.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            queue_capacity,
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, ConnectionEntry>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the next identity and store a fresh delivery channel for it.
    ///
    /// Returns the identity together with the consumer half of the channel.
    /// Never fails.
    pub fn register(&self) -> (ConnectionId, DeliveryReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let closing = CancellationToken::new();

        self.lock().insert(
            id,
            ConnectionEntry {
                queue: tx,
                closing: closing.clone(),
            },
        );

        (id, DeliveryReceiver { queue: rx, closing })
    }

    /// Remove a connection if present; a no-op for unknown identities.
    ///
    /// Cancels the connection's close token so a consumer still blocked in
    /// [`DeliveryReceiver::pull`] unblocks promptly.
    pub fn unregister(&self, id: ConnectionId) {
        if let Some(entry) = self.lock().remove(&id) {
            entry.closing.cancel();
            debug!(connection = id, "connection unregistered");
        }
    }

    /// Current membership, sorted by identity.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Queue depth per connection, sorted by identity. Introspection only.
    #[must_use]
    pub fn queue_depths(&self) -> Vec<(ConnectionId, usize)> {
        let mut depths: Vec<(ConnectionId, usize)> = self
            .lock()
            .iter()
            .map(|(id, entry)| {
                (
                    *id,
                    entry.queue.max_capacity() - entry.queue.capacity(),
                )
            })
            .collect();
        depths.sort_unstable_by_key(|(id, _)| *id);
        depths
    }

    /// Fan a message out to every registered connection, best effort.
    ///
    /// The message is serialized once; a full or closed queue is logged and
    /// skipped without affecting other recipients. Broadcasting to an empty
    /// registry is a no-op. Returns the number of queues the frame reached.
    pub fn broadcast(&self, message: &Outbound) -> usize {
        let frame: Arc<str> = match serde_json::to_string(message) {
            Ok(json) => json.into(),
            Err(err) => {
                error!(%err, "failed to serialize broadcast message");
                return 0;
            }
        };

        let targets: Vec<(ConnectionId, mpsc::Sender<QueueItem>)> = self
            .lock()
            .iter()
            .map(|(id, entry)| (*id, entry.queue.clone()))
            .collect();

        if targets.is_empty() {
            debug!("no active connections; dropping broadcast");
            return 0;
        }

        let mut delivered = 0;
        for (id, queue) in targets {
            match queue.try_send(QueueItem::Frame(Arc::clone(&frame))) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(connection = id, "delivery queue full; dropping frame");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection = id, "delivery queue closed; skipping");
                }
            }
        }

        delivered
    }

    /// Push the close sentinel onto every registered connection's queue.
    ///
    /// Falls back to cancelling the connection's token when its queue is
    /// full or already gone, so closing never blocks the caller. Entries are
    /// removed later by each stream's own cleanup, and connections
    /// registered after this call are unaffected. Returns the number of
    /// connections signalled.
    pub fn close_all(&self) -> usize {
        let guard = self.lock();
        let signalled = guard.len();

        for (id, entry) in guard.iter() {
            if entry.queue.try_send(QueueItem::Close).is_err() {
                debug!(connection = id, "close sentinel rejected; cancelling");
                entry.closing.cancel();
            }
        }

        signalled
    }
}
