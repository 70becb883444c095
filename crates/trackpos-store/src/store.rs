//! Backend-agnostic position store.
//!
//! [`PositionStore`] uses enum dispatch rather than a trait object because
//! async methods are not dyn-compatible. Callers see a single contract:
//!
//! - `get(key)` returns the stored integer, `0` when absent
//! - `incr_by(key, delta)` adds `delta` atomically relative to every other
//!   incrementer and returns the new value
//! - `set(key, value)` overwrites unconditionally

use crate::dragonfly::DragonflyStore;
use crate::error::StoreError;
use crate::memory::MemoryStore;

/// Which backend a [`PositionStore`] should be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// A `Dragonfly` or Redis server.
    #[default]
    Dragonfly,
    /// A process-local map (no persistence, no sharing across processes).
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dragonfly" | "redis" => Ok(Self::Dragonfly),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::Config(format!("unknown store backend: {other}"))),
        }
    }
}

/// Connection settings for the position store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend to use.
    pub backend: StoreBackend,
    /// Server address as `host:port`.
    pub addr: String,
    /// Optional password.
    pub password: Option<String>,
    /// Logical database index.
    pub database: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Dragonfly,
            addr: String::from("localhost:6379"),
            password: None,
            database: 0,
        }
    }
}

/// The state store adapter.
#[derive(Clone)]
pub enum PositionStore {
    /// `Dragonfly`/Redis backend.
    Dragonfly(DragonflyStore),
    /// In-memory backend.
    Memory(MemoryStore),
}

impl PositionStore {
    /// Open the backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the `Dragonfly` connection cannot be
    /// established.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Dragonfly => Ok(Self::Dragonfly(DragonflyStore::connect(config).await?)),
            StoreBackend::Memory => {
                tracing::info!("Using in-memory position store");
                Ok(Self::Memory(MemoryStore::new()))
            }
        }
    }

    /// Create a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Read the integer at `key`, `0` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    pub async fn get(&self, key: &str) -> Result<i64, StoreError> {
        match self {
            Self::Dragonfly(store) => store.get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    /// Atomically add `delta` to `key` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects or fails the increment.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        match self {
            Self::Dragonfly(store) => store.incr_by(key, delta).await,
            Self::Memory(store) => store.incr_by(key, delta).await,
        }
    }

    /// Overwrite `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend write fails.
    pub async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        match self {
            Self::Dragonfly(store) => store.set(key, value).await,
            Self::Memory(store) => {
                store.set(key, value).await;
                Ok(())
            }
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dragonfly(_) => "dragonfly",
            Self::Memory(_) => "memory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!("dragonfly".parse::<StoreBackend>().ok(), Some(StoreBackend::Dragonfly));
        assert_eq!("Redis".parse::<StoreBackend>().ok(), Some(StoreBackend::Dragonfly));
        assert_eq!("memory".parse::<StoreBackend>().ok(), Some(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[tokio::test]
    async fn memory_dispatch_round_trip() {
        let store = PositionStore::in_memory();
        assert_eq!(store.name(), "memory");
        assert_eq!(store.get("k").await.ok(), Some(0));
        assert_eq!(store.incr_by("k", 7).await.ok(), Some(7));
        assert!(store.set("k", 0).await.is_ok());
        assert_eq!(store.get("k").await.ok(), Some(0));
    }

    #[tokio::test]
    async fn open_memory_backend() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let store = PositionStore::open(&config).await;
        assert!(matches!(store, Ok(PositionStore::Memory(_))));
    }
}
