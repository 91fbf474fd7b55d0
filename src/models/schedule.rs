// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Patrol schedule model and per-tanod patrol status.

use super::patrol_area::PatrolAreaRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Patrol progress for one tanod on one schedule.
///
/// `Ended` is terminal for the (schedule, tanod) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PatrolStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    Started,
    Ended,
}

impl PatrolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatrolStatus::NotStarted => "Not Started",
            PatrolStatus::Started => "Started",
            PatrolStatus::Ended => "Ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PatrolStatusEntry {
    pub tanod_id: String,
    pub status: PatrolStatus,
}

/// A scheduled patrol shift for a unit of tanods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PatrolSchedule {
    pub id: String,
    /// Unit label (e.g., "Unit Alpha")
    pub unit: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Tanod user IDs assigned to this shift
    #[serde(default)]
    pub tanods: Vec<String>,
    #[serde(default)]
    pub patrol_area: Option<PatrolAreaRef>,
    /// At most one entry per tanod
    #[serde(default)]
    pub patrol_status: Vec<PatrolStatusEntry>,
}

impl PatrolSchedule {
    pub fn is_assigned(&self, tanod_id: &str) -> bool {
        self.tanods.iter().any(|t| t == tanod_id)
    }

    /// Current status for a tanod; no entry means the patrol has not started.
    pub fn status_for(&self, tanod_id: &str) -> PatrolStatus {
        self.patrol_status
            .iter()
            .find(|entry| entry.tanod_id == tanod_id)
            .map(|entry| entry.status)
            .unwrap_or(PatrolStatus::NotStarted)
    }

    /// Set a tanod's status, replacing any existing entry.
    pub fn set_status(&mut self, tanod_id: &str, status: PatrolStatus) {
        match self
            .patrol_status
            .iter_mut()
            .find(|entry| entry.tanod_id == tanod_id)
        {
            Some(entry) => entry.status = status,
            None => self.patrol_status.push(PatrolStatusEntry {
                tanod_id: tanod_id.to_string(),
                status,
            }),
        }
    }

    /// A schedule stays visible to a tanod until it is over and their
    /// patrol is no longer running.
    pub fn is_active_for(&self, tanod_id: &str, now: DateTime<Utc>) -> bool {
        now <= self.end_time || self.status_for(tanod_id) == PatrolStatus::Started
    }
}
