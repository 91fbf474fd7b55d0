// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Patrol state machine: `Not Started` → `Started` → `Ended`.
//!
//! Starting a patrol is gated by the pre-start window and by geofence
//! containment against the schedule's patrol area. Each check and the status
//! write happen under the schedule's lock.

use crate::db::MemoryDb;
use crate::geometry::LatLng;
use crate::models::{PatrolSchedule, PatrolStatus};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};

/// Errors from patrol start/end transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatrolError {
    #[error("Schedule {0} not found")]
    NotFound(String),

    #[error("You are not assigned to this patrol schedule")]
    NotAssigned { schedule_id: String },

    #[error(
        "Too early to start this patrol; it opens at {}",
        format_utc_rfc3339(.opens_at)
    )]
    TooEarly { opens_at: DateTime<Utc> },

    #[error("This schedule has no patrol area boundary")]
    MissingAreaData { schedule_id: String },

    #[error("You must be inside the {legend} patrol area to start this patrol")]
    OutsideGeofence { legend: String },

    #[error("This patrol has already ended")]
    AlreadyEnded { schedule_id: String },

    #[error("This patrol has not been started")]
    PatrolNotStarted { schedule_id: String },
}

impl PatrolError {
    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PatrolError::NotFound(_) => "not_found",
            PatrolError::NotAssigned { .. } => "not_assigned",
            PatrolError::TooEarly { .. } => "too_early",
            PatrolError::MissingAreaData { .. } => "missing_area_data",
            PatrolError::OutsideGeofence { .. } => "outside_geofence",
            PatrolError::AlreadyEnded { .. } => "already_ended",
            PatrolError::PatrolNotStarted { .. } => "patrol_not_started",
        }
    }
}

/// Runs patrol transitions against the schedule store.
#[derive(Clone)]
pub struct PatrolService {
    db: MemoryDb,
    start_window: Duration,
}

impl PatrolService {
    pub fn new(db: MemoryDb, start_window: Duration) -> Self {
        Self { db, start_window }
    }

    pub fn start_window(&self) -> Duration {
        self.start_window
    }

    /// Start a tanod's patrol on a schedule.
    ///
    /// Checks run in order: assignment, terminal state, pre-start window,
    /// area data, geofence. Starting an already-started patrol is a no-op.
    pub fn start_patrol(
        &self,
        schedule_id: &str,
        tanod_id: &str,
        location: LatLng,
        now: DateTime<Utc>,
    ) -> Result<PatrolSchedule, PatrolError> {
        let start_window = self.start_window;

        let result = self
            .db
            .update_schedule(schedule_id, |schedule| {
                if !schedule.is_assigned(tanod_id) {
                    return Err(PatrolError::NotAssigned {
                        schedule_id: schedule.id.clone(),
                    });
                }

                match schedule.status_for(tanod_id) {
                    PatrolStatus::Started => return Ok((schedule.clone(), false)),
                    PatrolStatus::Ended => {
                        return Err(PatrolError::AlreadyEnded {
                            schedule_id: schedule.id.clone(),
                        })
                    }
                    PatrolStatus::NotStarted => {}
                }

                let opens_at = schedule.start_time - start_window;
                if now < opens_at {
                    return Err(PatrolError::TooEarly { opens_at });
                }

                let Some(area) = schedule
                    .patrol_area
                    .as_ref()
                    .and_then(|r| r.area())
                    .filter(|a| a.has_geometry())
                else {
                    return Err(PatrolError::MissingAreaData {
                        schedule_id: schedule.id.clone(),
                    });
                };

                if !area.contains(location) {
                    return Err(PatrolError::OutsideGeofence {
                        legend: area.legend.clone(),
                    });
                }

                schedule.set_status(tanod_id, PatrolStatus::Started);
                Ok((schedule.clone(), true))
            })
            .unwrap_or_else(|| Err(PatrolError::NotFound(schedule_id.to_string())));

        match &result {
            Ok((_, true)) => tracing::info!(
                schedule_id,
                tanod_id,
                lat = location.lat,
                lng = location.lng,
                "Patrol started"
            ),
            Ok((_, false)) => {
                tracing::debug!(schedule_id, tanod_id, "Patrol already started")
            }
            Err(e) => tracing::info!(
                schedule_id,
                tanod_id,
                reason = e.code(),
                "Patrol start rejected"
            ),
        }

        result.map(|(schedule, _)| schedule)
    }

    /// End a tanod's patrol. Ending an already-ended patrol is a no-op.
    pub fn end_patrol(
        &self,
        schedule_id: &str,
        tanod_id: &str,
    ) -> Result<PatrolSchedule, PatrolError> {
        let schedule = self
            .db
            .update_schedule(schedule_id, |schedule| {
                match schedule.status_for(tanod_id) {
                    PatrolStatus::NotStarted => Err(PatrolError::PatrolNotStarted {
                        schedule_id: schedule.id.clone(),
                    }),
                    PatrolStatus::Started => {
                        schedule.set_status(tanod_id, PatrolStatus::Ended);
                        Ok(schedule.clone())
                    }
                    PatrolStatus::Ended => Ok(schedule.clone()),
                }
            })
            .unwrap_or_else(|| Err(PatrolError::NotFound(schedule_id.to_string())))?;

        tracing::info!(schedule_id, tanod_id, "Patrol ended");
        Ok(schedule)
    }

    /// Schedules the tanod should still see start/end controls for.
    pub fn active_schedules_for(&self, tanod_id: &str, now: DateTime<Utc>) -> Vec<PatrolSchedule> {
        self.db
            .schedules_for_tanod(tanod_id)
            .into_iter()
            .filter(|s| s.is_active_for(tanod_id, now))
            .collect()
    }

    /// The schedule a tanod is currently patrolling, if any.
    pub fn current_patrol(&self, tanod_id: &str) -> Option<PatrolSchedule> {
        self.db
            .schedules_for_tanod(tanod_id)
            .into_iter()
            .find(|s| s.status_for(tanod_id) == PatrolStatus::Started)
    }
}
