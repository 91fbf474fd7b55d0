// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire messages for the realtime channel (JSON, tagged on `type`).

use crate::models::LocationSample;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Named rooms that scope event delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Room {
    Tracking,
    Resources,
    VehicleRequests,
}

impl Room {
    pub fn as_str(&self) -> &'static str {
        match self {
            Room::Tracking => "tracking",
            Room::Resources => "resources",
            Room::VehicleRequests => "vehicle-requests",
        }
    }
}

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join { room: Room },
    Leave { room: Room },
    /// A tanod mirroring its own location sample
    LocationUpdate(LocationSample),
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    LocationUpdate(LocationSample),
    VehicleRequestUpdate {
        request: serde_json::Value,
        action: String,
    },
    #[serde(rename_all = "camelCase")]
    UserStatusUpdate { user_id: String, is_online: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_join_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join","room":"vehicle-requests"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room: Room::VehicleRequests
            }
        );
    }

    #[test]
    fn test_location_update_is_flat() {
        let event = ServerEvent::LocationUpdate(LocationSample {
            user_id: "t1".to_string(),
            latitude: 14.5,
            longitude: 121.0,
            current_schedule_id: Some("s1".to_string()),
            marker_color: "blue".to_string(),
            is_on_patrol: true,
            last_update: Utc::now(),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "locationUpdate");
        assert_eq!(value["userId"], "t1");
        assert_eq!(value["markerColor"], "blue");
        assert_eq!(value["isOnPatrol"], true);
    }

    #[test]
    fn test_user_status_wire_format() {
        let event = ServerEvent::UserStatusUpdate {
            user_id: "t1".to_string(),
            is_online: false,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "userStatusUpdate");
        assert_eq!(value["userId"], "t1");
        assert_eq!(value["isOnline"], false);
    }
}
