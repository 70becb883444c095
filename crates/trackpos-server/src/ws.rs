//! `WebSocket` subscription endpoint and per-connection lifecycle.
//!
//! Clients connect to `GET /ws` and receive a JSON-encoded
//! [`PositionSnapshot`](crate::state::PositionSnapshot) once on connect and
//! again after every update. Frames sent by the client are ignored.
//!
//! Each connection is split into two halves that run concurrently:
//!
//! - the **writer** drains the connection's outbox into the socket, giving
//!   each frame at most the broadcast deadline
//! - the **reader** only watches for the peer going away
//!
//! When either half finishes the connection is closed and removed from the
//! registry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, Utf8Bytes};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::coordinator::PositionCoordinator;
use crate::error::ApiError;
use crate::registry::Subscriber;
use crate::state::AppState;

/// Frames that may queue for one connection before delivery starts
/// waiting on the deadline.
const OUTBOX_CAPACITY: usize = 16;

/// Why a subscriber connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The peer sent a close frame.
    PeerClosed,
    /// The inbound stream ended without a close frame.
    StreamEnded,
    /// Reading from the peer failed.
    ReadError(String),
    /// Writing a frame to the peer failed.
    WriteError(String),
    /// Writing a frame to the peer took longer than the deadline.
    WriteTimedOut,
    /// Every outbox sender was dropped (the subscriber was pruned).
    Released,
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::StreamEnded => write!(f, "stream ended"),
            Self::ReadError(e) => write!(f, "read error: {e}"),
            Self::WriteError(e) => write!(f, "write error: {e}"),
            Self::WriteTimedOut => write!(f, "write timed out"),
            Self::Released => write!(f, "released by server"),
        }
    }
}

/// Upgrade an HTTP request to a `WebSocket` subscription.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_subscribe(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let upgrade = upgrade.map_err(|e| {
        warn!(error = %e, "WebSocket upgrade rejected");
        ApiError::Upgrade(e.body_text())
    })?;

    Ok(upgrade
        .on_failed_upgrade(|e| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            let (sink, stream) = socket.split();
            serve_subscriber(sink, stream, state).await;
        }))
}

/// Run one subscriber connection from registration to removal.
///
/// Registers the connection, sends it the current position on a
/// background task, then waits until either the peer goes away or the
/// connection can no longer be written to. Returns once the subscriber
/// has been removed from the registry.
pub async fn serve_subscriber<W, R, E>(sink: W, stream: R, state: Arc<AppState>)
where
    W: Sink<Message> + Unpin + Send,
    W::Error: fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: fmt::Display,
{
    let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
    let subscriber = Subscriber::new(outbox);
    let id = subscriber.id();

    state.registry().add(subscriber.clone()).await;
    debug!(subscriber = %id, "WebSocket client connected");

    let coordinator = state.coordinator().clone();
    tokio::spawn(async move { send_current_position(&coordinator, &subscriber).await });

    let deadline = state.broadcaster().send_timeout();
    let reason = tokio::select! {
        reason = read_until_closed(stream) => reason,
        reason = write_outbox(sink, inbox, deadline) => reason,
    };

    state.registry().remove(id).await;
    debug!(subscriber = %id, %reason, "WebSocket client disconnected");
}

/// Fetch the current position and send it to `subscriber` only.
///
/// Runs detached, so an update broadcast between the read and the send can
/// be overtaken by this older value until the next update arrives.
async fn send_current_position(coordinator: &PositionCoordinator, subscriber: &Subscriber) {
    let position = match coordinator.current_position().await {
        Ok(position) => position,
        Err(e) => {
            warn!(subscriber = %subscriber.id(), error = %e, "Failed to read position for new client");
            return;
        }
    };

    if let Err(e) = coordinator.broadcaster().unicast(subscriber, position).await {
        debug!(subscriber = %subscriber.id(), error = %e, "Failed to send current position to new client");
    }
}

/// Consume inbound frames until the peer goes away. Payloads are ignored.
async fn read_until_closed<R, E>(mut stream: R) -> Disconnect
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => return Disconnect::PeerClosed,
            Ok(_) => {}
            Err(e) => return Disconnect::ReadError(e.to_string()),
        }
    }
    Disconnect::StreamEnded
}

/// Forward queued frames to the socket until the outbox is released or a
/// write fails.
async fn write_outbox<W>(mut sink: W, mut inbox: mpsc::Receiver<Utf8Bytes>, deadline: Duration) -> Disconnect
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    while let Some(frame) = inbox.recv().await {
        match tokio::time::timeout(deadline, sink.send(Message::Text(frame))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Disconnect::WriteError(e.to_string()),
            Err(_elapsed) => return Disconnect::WriteTimedOut,
        }
    }

    if let Err(e) = sink.close().await {
        debug!(error = %e, "Failed to close released WebSocket");
    }
    Disconnect::Released
}
