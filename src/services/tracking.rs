// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Last-known location tracking and fan-out to the `tracking` room.

use crate::db::MemoryDb;
use crate::error::AppError;
use crate::models::{LocationSample, DEFAULT_MARKER_COLOR};
use crate::realtime::{Hub, Room, ServerEvent};
use chrono::{DateTime, Utc};
use validator::Validate;

/// Stores location samples and mirrors accepted ones to admin clients.
#[derive(Clone)]
pub struct TrackingService {
    db: MemoryDb,
    hub: Hub,
}

impl TrackingService {
    pub fn new(db: MemoryDb, hub: Hub) -> Self {
        Self { db, hub }
    }

    /// Record a sample posted by `writer_id`.
    ///
    /// Only a user's own session may write their location. Returns whether
    /// the sample replaced the stored one (older samples are discarded).
    pub fn record_location(&self, writer_id: &str, sample: LocationSample) -> Result<bool, AppError> {
        if sample.user_id != writer_id {
            return Err(AppError::Forbidden(
                "Cannot update another user's location".to_string(),
            ));
        }
        sample.validate()?;

        let applied = self.db.upsert_location(sample.clone());
        if applied {
            tracing::debug!(
                user_id = %sample.user_id,
                on_patrol = sample.is_on_patrol,
                schedule_id = ?sample.current_schedule_id,
                "Location updated"
            );
            self.hub
                .publish(Room::Tracking, ServerEvent::LocationUpdate(sample));
        } else {
            tracing::debug!(user_id = %sample.user_id, "Discarded stale location sample");
        }
        Ok(applied)
    }

    /// Last-known locations, optionally only those currently on patrol.
    pub fn active_locations(&self, on_patrol_only: bool) -> Vec<LocationSample> {
        self.db
            .list_locations()
            .into_iter()
            .filter(|l| !on_patrol_only || l.is_on_patrol)
            .collect()
    }

    /// Clear patrol flags on a tanod's location after a patrol ends.
    ///
    /// Only clears the record if it still points at the ended schedule, so a
    /// newer patrol is not wiped. Returns the updated record when changed.
    pub fn clear_patrol_status(
        &self,
        tanod_id: &str,
        ended_schedule_id: &str,
        now: DateTime<Utc>,
    ) -> Option<LocationSample> {
        let cleared = self.db.update_location(tanod_id, |location| {
            let points_at_ended = match location.current_schedule_id.as_deref() {
                Some(id) => id == ended_schedule_id,
                None => location.is_on_patrol,
            };
            if !points_at_ended {
                return None;
            }

            location.is_on_patrol = false;
            location.current_schedule_id = None;
            location.marker_color = DEFAULT_MARKER_COLOR.to_string();
            location.last_update = location.last_update.max(now);
            Some(location.clone())
        })??;

        tracing::info!(
            tanod_id,
            schedule_id = ended_schedule_id,
            "Cleared patrol tracking flags"
        );
        self.hub
            .publish(Room::Tracking, ServerEvent::LocationUpdate(cleared.clone()));
        Some(cleared)
    }
}
