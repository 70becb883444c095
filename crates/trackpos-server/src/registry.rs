//! Registry of live `WebSocket` subscribers.
//!
//! A [`Subscriber`] is the sending half of one connection's outbox: a
//! bounded queue of pre-serialized text frames drained into the socket by
//! that connection's writer. The [`SubscriberRegistry`] owns one handle per
//! open connection. Every operation runs under a single mutex, and fan-out
//! iterates a [`snapshot`](SubscriberRegistry::snapshot) so no network
//! write ever happens while the lock is held.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Unique identifier for one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a frame could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The connection's writer has gone away.
    #[error("subscriber outbox closed")]
    Closed,

    /// The outbox stayed full for the whole delivery deadline.
    #[error("subscriber outbox full past deadline")]
    TimedOut,

    /// The position could not be serialized into a frame.
    #[error("position frame could not be encoded")]
    Encode,
}

/// Handle to one connected client.
///
/// Cloning yields another sender into the same outbox. Once every clone is
/// dropped the connection's writer sees the end of its queue and closes
/// the socket.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    outbox: mpsc::Sender<Utf8Bytes>,
}

impl Subscriber {
    /// Wrap the sending half of a connection outbox with a fresh identity.
    pub fn new(outbox: mpsc::Sender<Utf8Bytes>) -> Self {
        Self {
            id: SubscriberId::new(),
            outbox,
        }
    }

    /// The subscriber's identity.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Queue `frame` for this subscriber, waiting at most `deadline` for
    /// room in the outbox.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] if the writer is gone, or
    /// [`DeliveryError::TimedOut`] if the outbox stayed full.
    pub async fn deliver(&self, frame: Utf8Bytes, deadline: Duration) -> Result<(), DeliveryError> {
        self.outbox
            .send_timeout(frame, deadline)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryError::TimedOut,
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Whether the connection's writer has already gone away.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

/// Concurrency-safe set of active subscribers.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    members: Mutex<HashMap<SubscriberId, Subscriber>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber`.
    pub async fn add(&self, subscriber: Subscriber) {
        self.members.lock().await.insert(subscriber.id(), subscriber);
    }

    /// Deregister the subscriber with `id`.
    ///
    /// Returns `true` if it was present. Removing an absent subscriber is
    /// a no-op.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        self.members.lock().await.remove(&id).is_some()
    }

    /// Point-in-time copy of the current members.
    pub async fn snapshot(&self) -> Vec<Subscriber> {
        self.members.lock().await.values().cloned().collect()
    }

    /// Whether `id` is currently registered.
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.members.lock().await.contains_key(&id)
    }

    /// Number of registered subscribers.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Whether no subscribers are registered.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}
