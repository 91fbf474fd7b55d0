// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WebSocket endpoint for the realtime broadcast channel.

use crate::middleware::auth::AuthUser;
use crate::realtime::{run_session, ClientMessage, Hub, ServerEvent};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

const INBOUND_BUFFER: usize = 32;
const OUTBOUND_BUFFER: usize = 128;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, user.user_id))
}

/// Bridge a socket to a transport-independent session.
async fn handle_socket(socket: WebSocket, hub: Hub, user_id: String) {
    let (mut sink, mut stream) = socket.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientMessage>(INBOUND_BUFFER);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);

    let session = tokio::spawn(run_session(hub, user_id.clone(), inbound_rx, outbound_tx));

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode realtime event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(message) => {
                    if inbound_tx.send(message).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(user_id = %user_id, error = %e, "Ignoring malformed message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Closing the inbound side ends the session, which publishes offline status
    drop(inbound_tx);
    if let Err(e) = session.await {
        tracing::warn!(user_id = %user_id, error = %e, "Realtime session task failed");
    }
    writer.abort();
}
