//! REST endpoint handlers for the position API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/position` | Current position |
//! | `POST` | `/position` | Apply a delta and return the new position |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::{AppState, DeltaCommand, PositionSnapshot};

/// Return the current position.
///
/// # Route
///
/// `GET /position`
pub async fn get_position(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PositionSnapshot>, ApiError> {
    let position = state.coordinator().current_position().await?;
    Ok(Json(PositionSnapshot { position }))
}

/// Apply `{"delta": n}` to the position, broadcast the result to every
/// subscriber, and return it.
///
/// The body is decoded as JSON whatever its `Content-Type`, and a missing
/// `delta` reads as `0`. Only a body that does not decode is rejected.
///
/// # Route
///
/// `POST /position`
pub async fn update_position(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PositionSnapshot>, ApiError> {
    let command: DeltaCommand =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedRequest(e.to_string()))?;
    let position = state.coordinator().apply_delta(command.delta).await?;
    Ok(Json(PositionSnapshot { position }))
}
