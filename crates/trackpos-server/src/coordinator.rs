//! Sequencing of position updates and their fan-out.
//!
//! An update is one atomic `incr_by` against the store, an optional clamp
//! back to zero, and one broadcast of the effective value. Concurrency
//! safety of the position itself comes entirely from the store: there is
//! no server-side lock on the hot path, so several server processes can
//! share one store without losing deltas.
//!
//! The clamp is a separate, best-effort write. Two decrements racing past
//! zero may each observe a negative value and each reset the key to `0`;
//! this is safe but can discard magnitude that a strict accumulator would
//! have kept.

use trackpos_store::{PositionStore, StoreError};
use tracing::{debug, warn};

use crate::broadcast::Broadcaster;

/// Applies deltas to the shared position and announces the result.
#[derive(Clone)]
pub struct PositionCoordinator {
    store: PositionStore,
    key: String,
    broadcaster: Broadcaster,
}

impl PositionCoordinator {
    /// Create a coordinator over `store`, tracking the position at `key`.
    pub const fn new(store: PositionStore, key: String, broadcaster: Broadcaster) -> Self {
        Self {
            store,
            key,
            broadcaster,
        }
    }

    /// The broadcast engine used after each update.
    pub const fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Read the current position from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    pub async fn current_position(&self) -> Result<i64, StoreError> {
        self.store.get(&self.key).await
    }

    /// Add `delta` to the position, clamp at zero, and broadcast.
    ///
    /// A zero delta is a legal no-op that still broadcasts the current
    /// value. Returns the effective (clamped) position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the increment fails. Nothing is
    /// broadcast in that case.
    pub async fn apply_delta(&self, delta: i64) -> Result<i64, StoreError> {
        let raw = self.store.incr_by(&self.key, delta).await?;
        let clamp = if raw < 0 {
            Some(self.store.set(&self.key, 0).await)
        } else {
            None
        };
        Ok(self.announce(delta, raw, clamp).await)
    }

    /// Settle the effective position after an increment and broadcast it.
    ///
    /// `clamp` is the outcome of the reset to zero, present only when `raw`
    /// went negative. A failed reset is logged and the position is still
    /// reported as `0`.
    async fn announce(&self, delta: i64, raw: i64, clamp: Option<Result<(), StoreError>>) -> i64 {
        let position = match clamp {
            None => raw,
            Some(Ok(())) => 0,
            Some(Err(e)) => {
                warn!(error = %e, key = %self.key, raw, "Failed to clamp position to zero");
                0
            }
        };

        let report = self.broadcaster.broadcast(position).await;
        debug!(
            delta,
            raw,
            position,
            delivered = report.delivered,
            pruned = report.pruned,
            "Position updated"
        );

        position
    }
}
