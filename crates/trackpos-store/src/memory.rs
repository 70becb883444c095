//! Process-local backend for development and tests.
//!
//! Every operation runs under one async mutex, which gives `incr_by` the
//! same indivisibility the `Dragonfly` backend gets from `INCRBY`, but only
//! among callers sharing this [`MemoryStore`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::StoreError;

/// In-memory integer key-value store.
///
/// Cloning is cheap and shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, i64>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the integer stored at `key`, or `0` when the key is absent.
    pub async fn get(&self, key: &str) -> i64 {
        self.values.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Atomically add `delta` to `key` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Overflow`] if the result leaves the `i64`
    /// range. The stored value is left untouched in that case.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut values = self.values.lock().await;
        let current = values.get(key).copied().unwrap_or(0);
        let next = current.checked_add(delta).ok_or_else(|| StoreError::Overflow {
            key: key.to_owned(),
        })?;
        values.insert(key.to_owned(), next);
        Ok(next)
    }

    /// Overwrite `key` with `value`.
    pub async fn set(&self, key: &str, value: i64) {
        self.values.lock().await.insert(key.to_owned(), value);
    }

    /// Delete `key`.
    pub async fn delete(&self, key: &str) {
        self.values.lock().await.remove(key);
    }
}
