//! Error types for the position API.
//!
//! [`ApiError`] unifies all failure modes surfaced to HTTP callers into a
//! single enum that can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Subscriber delivery failures never reach this type; they are handled by
//! pruning the subscriber.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use trackpos_store::StoreError;

/// Errors that can occur in the position API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backing store was unreachable or rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The request body could not be parsed.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The `WebSocket` upgrade could not be performed.
    #[error("upgrade failed: {0}")]
    Upgrade(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::MalformedRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Upgrade(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
