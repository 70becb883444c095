//! State store adapter for the shared track position.
//!
//! The position is a single signed integer held by an external store
//! under one well-known key. The server keeps no authoritative copy:
//! every read goes back to the store, and every update is a single
//! atomic increment executed by the store itself.
//!
//! # Modules
//!
//! - [`store`] -- [`PositionStore`] contract and backend selection
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`memory`] -- process-local backend
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{PositionStore, StoreBackend, StoreConfig};
