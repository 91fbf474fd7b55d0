// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client side of the realtime channel.
//!
//! A supervisor task owns the connection and moves it through
//! `Disconnected` → `Connecting` → `Connected`. After an unexpected close or
//! a failed connect it waits a fixed backoff and tries again. An explicit
//! [`RealtimeClient::close`] stops the supervisor for good.

use super::error::ClientError;
use crate::models::LocationSample;
use crate::realtime::{run_session, ClientMessage, Hub, Room, ServerEvent};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

const SESSION_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// An open connection: messages go out on `outgoing`, events arrive on
/// `incoming`. The server closing the connection ends `incoming`.
pub struct Connection {
    pub outgoing: mpsc::Sender<ClientMessage>,
    pub incoming: mpsc::Receiver<ServerEvent>,
}

/// Transport used to open realtime connections.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<Connection, ClientError>> + Send;
}

/// Connects in-process to a [`Hub`] as the given user.
#[derive(Clone)]
pub struct HubConnector {
    hub: Hub,
    user_id: String,
}

impl HubConnector {
    pub fn new(hub: Hub, user_id: impl Into<String>) -> Self {
        Self {
            hub,
            user_id: user_id.into(),
        }
    }
}

impl Connector for HubConnector {
    async fn connect(&self) -> Result<Connection, ClientError> {
        let (outgoing, inbound) = mpsc::channel(SESSION_BUFFER);
        let (outbound, incoming) = mpsc::channel(SESSION_BUFFER);
        tokio::spawn(run_session(
            self.hub.clone(),
            self.user_id.clone(),
            inbound,
            outbound,
        ));
        Ok(Connection { outgoing, incoming })
    }
}

enum Command {
    Send(ClientMessage),
    Reconnect,
    Close,
}

enum Outcome {
    Dropped,
    Reconnect,
    Close,
}

/// Handle to a supervised realtime connection.
#[derive(Clone)]
pub struct RealtimeClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    events: broadcast::Sender<ServerEvent>,
}

impl RealtimeClient {
    /// Start the supervisor. `rooms` are joined on every connect.
    pub fn spawn<C: Connector>(connector: C, rooms: Vec<Room>, backoff: Duration) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        tokio::spawn(supervise(
            connector,
            rooms,
            backoff,
            command_rx,
            state_tx,
            events.clone(),
        ));

        Self {
            commands,
            state,
            events,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the connection reaches `target`. Returns false if the
    /// supervisor has stopped.
    pub async fn wait_for(&self, target: ConnectionState) -> bool {
        let mut state = self.state.clone();
        let reached = state.wait_for(|s| *s == target).await.is_ok();
        reached
    }

    /// Events received from joined rooms.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        if self.state() != ConnectionState::Connected {
            return Err(ClientError::Network(
                "realtime channel is not connected".to_string(),
            ));
        }
        self.commands
            .send(Command::Send(message))
            .map_err(|_| ClientError::Network("realtime channel is closed".to_string()))
    }

    /// Mirror a location sample to the `tracking` room.
    pub fn mirror_location(&self, sample: &LocationSample) -> Result<(), ClientError> {
        self.send(ClientMessage::LocationUpdate(sample.clone()))
    }

    /// Drop the current connection and connect again right away.
    pub fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Close the connection without retrying.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

async fn supervise<C: Connector>(
    connector: C,
    rooms: Vec<Room>,
    backoff: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<ServerEvent>,
) {
    loop {
        state.send_replace(ConnectionState::Connecting);

        let mut connection = match connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(error = %e, "Realtime connect failed");
                state.send_replace(ConnectionState::Disconnected);
                if wait_backoff(&mut commands, backoff).await {
                    continue;
                }
                break;
            }
        };

        let mut joined = true;
        for room in &rooms {
            if connection
                .outgoing
                .send(ClientMessage::Join { room: *room })
                .await
                .is_err()
            {
                joined = false;
                break;
            }
        }

        let outcome = if joined {
            state.send_replace(ConnectionState::Connected);
            tracing::debug!(rooms = rooms.len(), "Realtime connected");
            pump(&mut connection, &mut commands, &events).await
        } else {
            Outcome::Dropped
        };

        drop(connection);
        state.send_replace(ConnectionState::Disconnected);

        match outcome {
            Outcome::Close => break,
            Outcome::Reconnect => {
                tracing::debug!("Realtime reconnect requested");
            }
            Outcome::Dropped => {
                tracing::warn!(
                    backoff_ms = backoff.as_millis() as u64,
                    "Realtime connection lost; retrying"
                );
                if !wait_backoff(&mut commands, backoff).await {
                    break;
                }
            }
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    tracing::debug!("Realtime client closed");
}

async fn pump(
    connection: &mut Connection,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &broadcast::Sender<ServerEvent>,
) -> Outcome {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(message)) => {
                    if connection.outgoing.send(message).await.is_err() {
                        return Outcome::Dropped;
                    }
                }
                Some(Command::Reconnect) => return Outcome::Reconnect,
                Some(Command::Close) | None => return Outcome::Close,
            },
            event = connection.incoming.recv() => match event {
                Some(event) => {
                    // No local subscribers is fine
                    let _ = events.send(event);
                }
                None => return Outcome::Dropped,
            },
        }
    }
}

/// Sleep for the backoff. Returns false if the client was closed meanwhile.
async fn wait_backoff(commands: &mut mpsc::UnboundedReceiver<Command>, backoff: Duration) -> bool {
    let sleep = tokio::time::sleep(backoff);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            command = commands.recv() => match command {
                Some(Command::Reconnect) => return true,
                Some(Command::Send(_)) => {
                    tracing::debug!("Dropping realtime message while disconnected");
                }
                Some(Command::Close) | None => return false,
            },
        }
    }
}
