//! Real-time position server.
//!
//! This crate provides an Axum HTTP server around one shared integer
//! position held by an external store:
//!
//! - **REST endpoints** (`GET`/`POST /position`) to read the position and
//!   submit signed deltas
//! - **`WebSocket` endpoint** (`/ws`) that pushes the position to every
//!   connected client on connect and after each update
//!
//! # Architecture
//!
//! ```text
//! POST /position --> PositionCoordinator --> PositionStore::incr_by (atomic)
//!                          |                       |
//!                          |                 clamp at zero
//!                          v
//!                     Broadcaster --> SubscriberRegistry::snapshot --> outboxes
//!
//! GET /ws --> serve_subscriber --> registry add --> initial snapshot
//!                                  reader/writer halves --> registry remove
//! ```
//!
//! The server never caches the position; the store's atomic increment is
//! the only synchronization on the update path. The only shared mutable
//! state in the process is the subscriber registry.

pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use broadcast::{BroadcastReport, Broadcaster};
pub use coordinator::PositionCoordinator;
pub use error::ApiError;
pub use registry::{Subscriber, SubscriberId, SubscriberRegistry};
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::{AppState, DeltaCommand, PositionSettings, PositionSnapshot};
