// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turns raw position fixes into enriched location samples.
//!
//! A sample is emitted only when it differs meaningfully from the last one
//! emitted: the tanod moved farther than the threshold, or their patrol
//! context (schedule, marker color, on-patrol flag) changed.

use crate::geometry::{distance_between, LatLng};
use crate::models::{LocationSample, PatrolSchedule, PatrolStatus, DEFAULT_MARKER_COLOR};
use chrono::{DateTime, Utc};

/// A raw fix from the device's position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius, if the source provides one
    pub accuracy_meters: Option<f64>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Patrol fields attached to every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolContext {
    pub schedule_id: Option<String>,
    pub marker_color: String,
}

impl Default for PatrolContext {
    fn default() -> Self {
        Self::idle()
    }
}

impl PatrolContext {
    /// Not on patrol.
    pub fn idle() -> Self {
        Self {
            schedule_id: None,
            marker_color: DEFAULT_MARKER_COLOR.to_string(),
        }
    }

    /// Context for the schedule this tanod has started, if any.
    pub fn resolve(schedules: &[PatrolSchedule], tanod_id: &str) -> Self {
        let Some(schedule) = schedules
            .iter()
            .find(|s| s.status_for(tanod_id) == PatrolStatus::Started)
        else {
            return Self::idle();
        };

        let marker_color = schedule
            .patrol_area
            .as_ref()
            .and_then(|area| area.area())
            .map(|area| area.color.clone())
            .filter(|color| !color.is_empty())
            .unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string());

        Self {
            schedule_id: Some(schedule.id.clone()),
            marker_color,
        }
    }

    pub fn is_on_patrol(&self) -> bool {
        self.schedule_id.is_some()
    }
}

/// Whether `next` should be sent given the last sample sent.
pub fn has_location_changed(
    prev: Option<&LocationSample>,
    next: &LocationSample,
    threshold_meters: f64,
) -> bool {
    let Some(prev) = prev else {
        return true;
    };

    distance_between(prev.position(), next.position()) > threshold_meters
        || prev.current_schedule_id != next.current_schedule_id
        || prev.marker_color != next.marker_color
        || prev.is_on_patrol != next.is_on_patrol
}

/// Stateful filter in front of the location POST.
#[derive(Debug, Clone)]
pub struct LocationSampler {
    user_id: String,
    threshold_meters: f64,
    last_emitted: Option<LocationSample>,
}

impl LocationSampler {
    pub fn new(user_id: impl Into<String>, threshold_meters: f64) -> Self {
        Self {
            user_id: user_id.into(),
            threshold_meters,
            last_emitted: None,
        }
    }

    /// Enrich a fix and return it if it is worth sending.
    pub fn observe(
        &mut self,
        fix: &PositionFix,
        context: &PatrolContext,
        now: DateTime<Utc>,
    ) -> Option<LocationSample> {
        let sample = LocationSample {
            user_id: self.user_id.clone(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            current_schedule_id: context.schedule_id.clone(),
            marker_color: context.marker_color.clone(),
            is_on_patrol: context.is_on_patrol(),
            last_update: now,
        };

        if !has_location_changed(self.last_emitted.as_ref(), &sample, self.threshold_meters) {
            return None;
        }

        self.last_emitted = Some(sample.clone());
        Some(sample)
    }

    pub fn last_emitted(&self) -> Option<&LocationSample> {
        self.last_emitted.as_ref()
    }

    /// Forget the last emitted sample so the next fix is sent regardless.
    ///
    /// Used when the server never received the last sample.
    pub fn invalidate(&mut self) {
        self.last_emitted = None;
    }
}
