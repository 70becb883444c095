//! Shared application state and wire types.
//!
//! [`AppState`] ties together the position store, the subscriber registry,
//! the broadcast engine, and the update coordinator. It holds no copy of
//! the position itself: every read is served by the store.

use std::sync::Arc;
use std::time::Duration;

use trackpos_store::PositionStore;

use crate::broadcast::Broadcaster;
use crate::coordinator::PositionCoordinator;
use crate::registry::SubscriberRegistry;

/// Key under which the position is stored unless configured otherwise.
pub const DEFAULT_POSITION_KEY: &str = "carPosition";

/// Default deadline for handing one frame to one subscriber.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Body of `POST /position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeltaCommand {
    /// Signed amount to add to the position. Absent means `0`.
    #[serde(default)]
    pub delta: i64,
}

/// The position as returned by the REST API and pushed over the `WebSocket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PositionSnapshot {
    /// Current position.
    pub position: i64,
}

/// Tunables for the shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSettings {
    /// Store key holding the position.
    pub key: String,
    /// Per-subscriber delivery deadline during fan-out.
    pub send_timeout: Duration,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            key: String::from(DEFAULT_POSITION_KEY),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    registry: Arc<SubscriberRegistry>,
    coordinator: PositionCoordinator,
}

impl AppState {
    /// Build the application state over `store`.
    pub fn new(store: PositionStore, settings: PositionSettings) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), settings.send_timeout);
        let coordinator = PositionCoordinator::new(store, settings.key, broadcaster);
        Self {
            registry,
            coordinator,
        }
    }

    /// State over a fresh in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::new(PositionStore::in_memory(), PositionSettings::default())
    }

    /// The subscriber registry.
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// The update coordinator.
    pub const fn coordinator(&self) -> &PositionCoordinator {
        &self.coordinator
    }

    /// The broadcast engine.
    pub const fn broadcaster(&self) -> &Broadcaster {
        self.coordinator.broadcaster()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shapes() {
        let snapshot = PositionSnapshot { position: 50 };
        assert_eq!(
            serde_json::to_string(&snapshot).ok().as_deref(),
            Some(r#"{"position":50}"#)
        );

        let command: Result<DeltaCommand, _> = serde_json::from_str(r#"{"delta":-200}"#);
        assert_eq!(command.ok(), Some(DeltaCommand { delta: -200 }));
    }

    #[test]
    fn missing_delta_defaults_to_zero() {
        let command: Result<DeltaCommand, _> = serde_json::from_str("{}");
        assert_eq!(command.ok(), Some(DeltaCommand { delta: 0 }));
    }

    #[test]
    fn fractional_delta_is_rejected() {
        let command: Result<DeltaCommand, _> = serde_json::from_str(r#"{"delta":1.5}"#);
        assert!(command.is_err());
    }
}
