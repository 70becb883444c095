//! Configuration for the position server.
//!
//! All configuration is loaded from environment variables once at
//! startup. The server needs to know how to reach the store, which key
//! holds the position, where to listen, and how long to wait on a slow
//! subscriber.

use std::time::Duration;

use trackpos_server::{PositionSettings, ServerConfig};
use trackpos_store::{StoreBackend, StoreConfig};

use crate::error::AppError;

/// Complete service configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Store connection settings.
    pub store: StoreConfig,
    /// Key and fan-out settings for the shared position.
    pub position: PositionSettings,
    /// Listen address.
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `STORE_BACKEND` -- `dragonfly`/`redis` or `memory` (default `dragonfly`)
    /// - `REDIS_ADDR` -- store address `host:port` (default `localhost:6379`)
    /// - `REDIS_PASS` -- store password (default none)
    /// - `REDIS_DB` -- store database index (default 0)
    /// - `POSITION_KEY` -- key holding the position (default `carPosition`)
    /// - `HOST` -- bind host (default `0.0.0.0`)
    /// - `PORT` -- bind port (default 8080)
    /// - `BROADCAST_TIMEOUT_MS` -- per-subscriber delivery deadline (default 1000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let backend: StoreBackend = var("STORE_BACKEND")
            .unwrap_or_else(|| "dragonfly".to_owned())
            .parse()?;

        let addr = var("REDIS_ADDR").unwrap_or_else(|| "localhost:6379".to_owned());
        let password = var("REDIS_PASS");

        let database: u8 = var("REDIS_DB")
            .unwrap_or_else(|| "0".to_owned())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid REDIS_DB: {e}")))?;

        let key = var("POSITION_KEY")
            .unwrap_or_else(|| trackpos_server::state::DEFAULT_POSITION_KEY.to_owned());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());

        let port: u16 = var("PORT")
            .unwrap_or_else(|| "8080".to_owned())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?;

        let send_timeout_ms: u64 = var("BROADCAST_TIMEOUT_MS")
            .unwrap_or_else(|| "1000".to_owned())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid BROADCAST_TIMEOUT_MS: {e}")))?;
        if send_timeout_ms == 0 {
            return Err(AppError::Config(String::from(
                "BROADCAST_TIMEOUT_MS must be greater than zero",
            )));
        }

        Ok(Self {
            store: StoreConfig {
                backend,
                addr,
                password,
                database,
            },
            position: PositionSettings {
                key,
                send_timeout: Duration::from_millis(send_timeout_ms),
            },
            server: ServerConfig { host, port },
        })
    }
}
