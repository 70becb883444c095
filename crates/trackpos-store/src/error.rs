//! Error types for the state store adapter.
//!
//! All errors are propagated via [`StoreError`]. The adapter never retries;
//! every failure is surfaced once to the caller.

/// Errors that can occur while reading or mutating the shared position.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `Dragonfly`/Redis operation failed (unreachable, rejected, etc.).
    #[error("Dragonfly error: {0}")]
    Backend(#[from] fred::error::Error),

    /// The stored value is not a signed 64-bit integer.
    #[error("value at {key} is not an integer: {value:?}")]
    InvalidValue {
        /// The key that was read.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// The increment would leave the `i64` range.
    #[error("increment on {key} would overflow")]
    Overflow {
        /// The key that was incremented.
        key: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
