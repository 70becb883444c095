//! Axum router construction for the position API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for the browser client.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// How long browsers may cache a preflight response.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /position` -- current position
/// - `POST /position` -- apply a delta
/// - `GET /ws` -- `WebSocket` position stream
///
/// Preflight `OPTIONS` requests are answered by the CORS layer.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE);

    Router::new()
        .route(
            "/position",
            get(handlers::get_position).post(handlers::update_position),
        )
        .route("/ws", get(ws::ws_subscribe))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
