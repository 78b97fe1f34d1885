//! `WebSocket` transport for observer channels.
//!
//! Clients connect to `GET /ws`. Each connection registers one channel
//! with the hub, immediately receives the current `{ currency, resource }`
//! and then one message per committed mutation. Inbound text is logged
//! and otherwise ignored.
//!
//! The channel ends when the client closes, the socket errors, a send
//! fails, or the dispatcher prunes the channel. A pruned channel's outbox
//! sender is dropped; the client then gets a close frame.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use clicker_db::StateStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` observer channel.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_channel<S: StateStore>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Drive one observer channel for its whole lifetime.
async fn handle_ws<S: StateStore>(mut socket: WebSocket, state: Arc<AppState<S>>) {
    let (tx, mut rx) = mpsc::channel(state.channel_capacity);

    let id = match state.hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Could not register channel, closing socket");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    info!(channel = %id, "Client connected");

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else {
                    debug!(channel = %id, "Channel pruned by dispatcher");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let json = match serde_json::to_string(&snapshot) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize snapshot: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(channel = %id, "Client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(channel = %id, "Client closed connection");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!(channel = %id, message = text.as_str(), "Received message");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(channel = %id, "Client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(channel = %id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    state.hub.unregister(id).await;
    info!(channel = %id, "Client disconnected");
}
