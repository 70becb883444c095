//! Error types for the position server binary.
//!
//! [`AppError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the position server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An environment variable held an invalid value.
    #[error("config error: {0}")]
    Config(String),

    /// The position store could not be opened or read.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: trackpos_store::StoreError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: trackpos_server::ServerError,
    },
}
