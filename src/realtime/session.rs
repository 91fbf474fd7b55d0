// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-connection session logic, independent of the transport.
//!
//! The WebSocket route and the in-process connector both feed decoded
//! [`ClientMessage`]s in and drain [`ServerEvent`]s out through channels.

use super::hub::Hub;
use super::messages::{ClientMessage, Room, ServerEvent};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Drive one client session until its inbound channel closes.
///
/// Publishes the user's online status on entry and offline status on exit.
/// Mirrored location samples are only accepted for the session's own user.
pub async fn run_session(
    hub: Hub,
    user_id: String,
    mut inbound: mpsc::Receiver<ClientMessage>,
    outbound: mpsc::Sender<ServerEvent>,
) {
    tracing::debug!(user_id = %user_id, "Realtime session opened");
    hub.publish(
        Room::Tracking,
        ServerEvent::UserStatusUpdate {
            user_id: user_id.clone(),
            is_online: true,
        },
    );

    let mut forwarders: HashMap<Room, JoinHandle<()>> = HashMap::new();

    while let Some(message) = inbound.recv().await {
        match message {
            ClientMessage::Join { room } => {
                forwarders.entry(room).or_insert_with(|| {
                    tracing::debug!(user_id = %user_id, room = room.as_str(), "Joined room");
                    tokio::spawn(forward(room, hub.subscribe(room), outbound.clone()))
                });
            }
            ClientMessage::Leave { room } => {
                if let Some(handle) = forwarders.remove(&room) {
                    handle.abort();
                    tracing::debug!(user_id = %user_id, room = room.as_str(), "Left room");
                }
            }
            ClientMessage::LocationUpdate(sample) => {
                if sample.user_id != user_id {
                    tracing::warn!(
                        user_id = %user_id,
                        sample_user = %sample.user_id,
                        "Rejected location mirror for another user"
                    );
                    continue;
                }
                hub.publish(Room::Tracking, ServerEvent::LocationUpdate(sample));
            }
        }
    }

    for handle in forwarders.into_values() {
        handle.abort();
    }

    hub.publish(
        Room::Tracking,
        ServerEvent::UserStatusUpdate {
            user_id: user_id.clone(),
            is_online: false,
        },
    );
    tracing::debug!(user_id = %user_id, "Realtime session closed");
}

async fn forward(
    room: Room,
    mut events: broadcast::Receiver<ServerEvent>,
    outbound: mpsc::Sender<ServerEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if outbound.send(event).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(room = room.as_str(), skipped, "Subscriber lagged; events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
