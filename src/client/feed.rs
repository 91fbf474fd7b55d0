// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin map feed of tanod markers.

use crate::models::LocationSample;
use crate::realtime::ServerEvent;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Last-writer-wins view of every tanod's marker.
///
/// An update replaces the stored marker only if its `last_update` is newer.
/// Position-only updates closer than the debounce interval to the applied
/// one are dropped; a change in patrol fields always goes through.
#[derive(Debug, Clone)]
pub struct LocationFeed {
    debounce: Duration,
    markers: HashMap<String, LocationSample>,
    online: HashSet<String>,
}

impl LocationFeed {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            markers: HashMap::new(),
            online: HashSet::new(),
        }
    }

    /// Apply a location update. Returns whether the marker changed.
    pub fn apply(&mut self, update: LocationSample) -> bool {
        if let Some(current) = self.markers.get(&update.user_id) {
            if update.last_update <= current.last_update {
                return false;
            }

            let patrol_changed = update.is_on_patrol != current.is_on_patrol
                || update.current_schedule_id != current.current_schedule_id
                || update.marker_color != current.marker_color;
            let within_debounce = (update.last_update - current.last_update)
                .to_std()
                .is_ok_and(|gap| gap < self.debounce);

            if within_debounce && !patrol_changed {
                return false;
            }
        }

        self.markers.insert(update.user_id.clone(), update);
        true
    }

    /// Apply a realtime event. Returns whether the feed changed.
    pub fn apply_event(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::LocationUpdate(sample) => self.apply(sample),
            ServerEvent::UserStatusUpdate { user_id, is_online } => {
                if is_online {
                    self.online.insert(user_id)
                } else {
                    self.online.remove(&user_id)
                }
            }
            ServerEvent::VehicleRequestUpdate { .. } => false,
        }
    }

    /// Seed the feed from `GET /api/locations/active`.
    pub fn load(&mut self, samples: impl IntoIterator<Item = LocationSample>) {
        for sample in samples {
            self.apply(sample);
        }
    }

    pub fn marker(&self, user_id: &str) -> Option<&LocationSample> {
        self.markers.get(user_id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &LocationSample> {
        self.markers.values()
    }

    /// Markers of tanods currently on patrol.
    pub fn on_patrol(&self) -> impl Iterator<Item = &LocationSample> {
        self.markers.values().filter(|m| m.is_on_patrol)
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.online.contains(user_id)
    }
}
