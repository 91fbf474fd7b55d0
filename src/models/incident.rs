// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Incident report model for storage and API.

use crate::geometry::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Response status of an incident. Transitions only move forward:
/// `Pending` → `In Progress` → `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IncidentStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IncidentClassification {
    #[serde(rename = "Emergency Incident")]
    Emergency,
    #[serde(rename = "Normal Incident")]
    Normal,
}

/// An incident reported by the public or by a tanod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IncidentReport {
    pub id: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub incident_classification: IncidentClassification,
    pub description: String,
    /// Raw location as submitted, optionally "Lat: x, Lon: y"
    pub location: String,
    /// Resolved street address, if geocoded
    #[serde(default)]
    pub address: Option<String>,
    pub status: IncidentStatus,
    #[serde(default)]
    pub responder_id: Option<String>,
    #[serde(default)]
    pub responder_name: Option<String>,
    /// Resolution log, set when the incident is resolved
    #[serde(default)]
    pub log: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IncidentReport {
    /// Parse coordinates out of a "Lat: x, Lon: y" location string.
    pub fn coordinates(&self) -> Option<LatLng> {
        let mut lat = None;
        let mut lng = None;

        for part in self.location.split(',') {
            let (key, value) = part.split_once(':')?;
            let value: f64 = value.trim().parse().ok()?;
            match key.trim().to_ascii_lowercase().as_str() {
                "lat" => lat = Some(value),
                "lon" | "lng" => lng = Some(value),
                _ => return None,
            }
        }

        Some(LatLng::new(lat?, lng?))
    }

    /// Whether this incident is currently held by the given tanod.
    pub fn is_held_by(&self, tanod_id: &str) -> bool {
        self.status == IncidentStatus::InProgress
            && self.responder_id.as_deref() == Some(tanod_id)
    }
}
