//! `Dragonfly` (Redis-compatible) backend for the shared position.
//!
//! The position lives under a single integer key. Atomicity of concurrent
//! updates is delegated entirely to the server's `INCRBY`, so several
//! processes may share one instance without any local locking.
//!
//! # Commands
//!
//! | Operation | Command | Notes |
//! |-----------|---------|-------|
//! | `get` | `GET key` | absent key reads as `0` |
//! | `incr_by` | `INCRBY key delta` | creates the key at `0` first |
//! | `set` | `SET key value` | unconditional, no expiry |

use fred::prelude::*;

use crate::error::StoreError;
use crate::store::StoreConfig;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`]. Cloning is cheap and shares the
/// underlying connection.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` using the address, password and database
    /// index from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the address cannot be parsed.
    /// Returns [`StoreError::Backend`] if the connection fails.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = format!("redis://{}", config.addr);
        let mut fred_config = Config::from_url(&url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly address {url}: {e}")))?;
        fred_config.password = config.password.clone();
        fred_config.database = Some(config.database);

        let client = Builder::from_config(fred_config).build()?;
        client.init().await?;

        tracing::info!(addr = %config.addr, database = config.database, "Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Read the integer stored at `key`, or `0` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidValue`] if the value is not an integer.
    /// Returns [`StoreError::Backend`] if the read fails.
    pub async fn get(&self, key: &str) -> Result<i64, StoreError> {
        let value: Option<String> = self.client.get(key).await?;
        value.map_or(Ok(0), |s| {
            s.parse::<i64>().map_err(|_parse| StoreError::InvalidValue {
                key: key.to_owned(),
                value: s,
            })
        })
    }

    /// Atomically add `delta` to `key` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the command fails, including the
    /// server rejecting an overflowing or non-integer increment.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let value: i64 = self.client.incr_by(key, delta).await?;
        Ok(value)
    }

    /// Overwrite `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the write fails.
    pub async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    /// Delete `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}
