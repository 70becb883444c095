//! Fan-out of position changes to every registered subscriber.
//!
//! The position is serialized once per pass. Deliveries to the members of
//! a registry snapshot run concurrently, each bounded by the configured
//! deadline, so a slow or dead client delays a pass by at most one
//! deadline and never blocks delivery to the others. Subscribers that
//! cannot accept the frame are removed from the registry; dropping their
//! last outbox sender closes the connection.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::registry::{DeliveryError, Subscriber, SubscriberRegistry};
use crate::state::PositionSnapshot;

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers that accepted the frame.
    pub delivered: usize,
    /// Subscribers removed because delivery failed.
    pub pruned: usize,
}

/// Pushes position frames to the members of a [`SubscriberRegistry`].
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    /// Create a broadcaster over `registry` with a per-subscriber deadline.
    pub const fn new(registry: Arc<SubscriberRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// The per-subscriber delivery deadline.
    pub const fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Serialize `position` into its wire frame.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn encode(position: i64) -> Result<Utf8Bytes, serde_json::Error> {
        let json = serde_json::to_string(&PositionSnapshot { position })?;
        Ok(Utf8Bytes::from(json))
    }

    /// Push `position` to every current subscriber.
    ///
    /// Never fails: per-subscriber failures are handled by pruning.
    pub async fn broadcast(&self, position: i64) -> BroadcastReport {
        let frame = match Self::encode(position) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, position, "Failed to serialize position broadcast");
                return BroadcastReport::default();
            }
        };

        let subscribers = self.registry.snapshot().await;
        if subscribers.is_empty() {
            return BroadcastReport::default();
        }

        let deadline = self.send_timeout;
        let outcomes = join_all(subscribers.iter().map(|subscriber| {
            let frame = frame.clone();
            async move { (subscriber.id(), subscriber.deliver(frame, deadline).await) }
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(e) => {
                    match e {
                        DeliveryError::Closed | DeliveryError::Encode => {
                            debug!(subscriber = %id, error = %e, "Pruning closed subscriber");
                        }
                        DeliveryError::TimedOut => warn!(
                            subscriber = %id,
                            timeout_ms = deadline.as_millis(),
                            "Pruning slow subscriber"
                        ),
                    }
                    if self.registry.remove(id).await {
                        report.pruned = report.pruned.saturating_add(1);
                    }
                }
            }
        }

        report
    }

    /// Send `position` to `subscriber` alone.
    ///
    /// Used for the initial snapshot of a new connection. A failure is not
    /// pruned here; the connection's own lifecycle handles it.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Encode`] if the frame could not be built,
    /// otherwise the error from [`Subscriber::deliver`].
    pub async fn unicast(&self, subscriber: &Subscriber, position: i64) -> Result<(), DeliveryError> {
        let frame = Self::encode(position).map_err(|e| {
            warn!(error = %e, position, "Failed to serialize position snapshot");
            DeliveryError::Encode
        })?;
        subscriber.deliver(frame, self.send_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn broadcaster() -> (Broadcaster, Arc<SubscriberRegistry>) {
        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Duration::from_millis(50));
        (broadcaster, registry)
    }

    async fn register(
        registry: &SubscriberRegistry,
        capacity: usize,
    ) -> (Subscriber, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let subscriber = Subscriber::new(tx);
        registry.add(subscriber.clone()).await;
        (subscriber, rx)
    }

    #[tokio::test]
    async fn empty_registry_is_a_no_op() {
        let (broadcaster, _registry) = broadcaster();
        assert_eq!(broadcaster.broadcast(5).await, BroadcastReport::default());
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_same_frame() {
        let (broadcaster, registry) = broadcaster();
        let (_a, mut rx_a) = register(&registry, 4).await;
        let (_b, mut rx_b) = register(&registry, 4).await;

        let report = broadcaster.broadcast(50).await;
        assert_eq!(report, BroadcastReport { delivered: 2, pruned: 0 });

        for rx in [&mut rx_a, &mut rx_b] {
            let frame = rx.recv().await;
            assert_eq!(frame.as_ref().map(Utf8Bytes::as_str), Some(r#"{"position":50}"#));
        }
    }

    #[tokio::test]
    async fn closed_subscriber_is_pruned_without_affecting_others() {
        let (broadcaster, registry) = broadcaster();
        let (dead, dead_rx) = register(&registry, 4).await;
        let (_live, mut live_rx) = register(&registry, 4).await;
        drop(dead_rx);

        let report = broadcaster.broadcast(7).await;
        assert_eq!(report, BroadcastReport { delivered: 1, pruned: 1 });
        assert!(!registry.contains(dead.id()).await);
        assert_eq!(registry.len().await, 1);
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn slow_subscriber_is_pruned_after_deadline() {
        let (broadcaster, registry) = broadcaster();
        let (slow, _slow_rx) = register(&registry, 1).await;
        let (_fast, mut fast_rx) = register(&registry, 4).await;

        // Fill the slow outbox so the next delivery has to wait.
        assert_eq!(broadcaster.broadcast(1).await.delivered, 2);

        let report = broadcaster.broadcast(2).await;
        assert_eq!(report, BroadcastReport { delivered: 1, pruned: 1 });
        assert!(!registry.contains(slow.id()).await);

        assert_eq!(fast_rx.recv().await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"position":1}"#));
        assert_eq!(fast_rx.recv().await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"position":2}"#));
    }

    #[tokio::test]
    async fn removed_subscriber_receives_nothing_further() {
        let (broadcaster, registry) = broadcaster();
        let (subscriber, mut rx) = register(&registry, 8).await;

        for position in 1..=3 {
            broadcaster.broadcast(position).await;
        }
        registry.remove(subscriber.id()).await;
        drop(subscriber);
        broadcaster.broadcast(4).await;

        let mut received = Vec::new();
        while let Some(frame) = rx.recv().await {
            received.push(frame.as_str().to_owned());
        }
        assert_eq!(
            received,
            vec![
                r#"{"position":1}"#.to_owned(),
                r#"{"position":2}"#.to_owned(),
                r#"{"position":3}"#.to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn unicast_reaches_only_the_target() {
        let (broadcaster, registry) = broadcaster();
        let (target, mut target_rx) = register(&registry, 4).await;
        let (_other, mut other_rx) = register(&registry, 4).await;

        assert!(broadcaster.unicast(&target, 9).await.is_ok());
        assert_eq!(target_rx.recv().await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"position":9}"#));
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unicast_to_closed_subscriber_reports_closed() {
        let (broadcaster, registry) = broadcaster();
        let (target, target_rx) = register(&registry, 4).await;
        drop(target_rx);

        let result = broadcaster.unicast(&target, 9).await;
        assert_eq!(result, Err(DeliveryError::Closed));
        assert_ne!(DeliveryError::Encode.to_string(), DeliveryError::Closed.to_string());
        // Unicast leaves pruning to the connection itself.
        assert!(registry.contains(target.id()).await);
    }
}
