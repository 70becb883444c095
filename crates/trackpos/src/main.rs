//! Position server binary.
//!
//! Wires the position store to the HTTP + `WebSocket` server. Loads
//! configuration from the environment, connects to the store, verifies it
//! is reachable, and serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from environment variables
//! 3. Connect to the position store
//! 4. Read the current position to confirm the store is reachable
//! 5. Build shared state and serve

mod config;
mod error;

use std::sync::Arc;

use trackpos_server::AppState;
use trackpos_store::PositionStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::error::AppError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store is
/// unreachable, or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("trackpos starting");

    // 2. Load configuration.
    let config = ServiceConfig::from_env()?;
    info!(
        backend = ?config.store.backend,
        store_addr = config.store.addr,
        database = config.store.database,
        key = config.position.key,
        send_timeout_ms = config.position.send_timeout.as_millis(),
        "Configuration loaded"
    );

    // 3. Connect to the store.
    let store = PositionStore::open(&config.store).await?;

    // 4. Confirm the store answers before accepting traffic.
    let position = store.get(&config.position.key).await?;
    info!(backend = store.name(), position, "Position store reachable");

    // 5. Serve.
    let state = Arc::new(AppState::new(store, config.position));
    trackpos_server::start_server(&config.server, state).await?;

    info!("trackpos shutdown complete");
    Ok(())
}
