// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Room-based broadcast hub.

use super::messages::{Room, ServerEvent};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

const DEFAULT_ROOM_CAPACITY: usize = 256;

/// Fan-out hub with one broadcast sender per room, created on first use.
///
/// Delivery is best-effort: slow receivers that fall behind the room
/// capacity lose the oldest events.
#[derive(Clone)]
pub struct Hub {
    rooms: Arc<DashMap<Room, broadcast::Sender<ServerEvent>>>,
    capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, room: Room) -> broadcast::Sender<ServerEvent> {
        self.rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<ServerEvent> {
        self.sender(room).subscribe()
    }

    /// Publish an event to a room. Returns how many subscribers received it.
    pub fn publish(&self, room: Room, event: ServerEvent) -> usize {
        match self.sender(room).send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(room = room.as_str(), "No subscribers for event");
                0
            }
        }
    }

    /// Announce a vehicle request change to both resource views.
    pub fn publish_vehicle_request(&self, request: serde_json::Value, action: &str) -> usize {
        let event = ServerEvent::VehicleRequestUpdate {
            request,
            action: action.to_string(),
        };
        self.publish(Room::VehicleRequests, event.clone()) + self.publish(Room::Resources, event)
    }

    pub fn subscriber_count(&self, room: Room) -> usize {
        self.rooms
            .get(&room)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}
