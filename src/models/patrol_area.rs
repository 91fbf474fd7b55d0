// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Patrol area model and geofence handling.

use crate::geometry::{point_in_polygon, LatLng};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Marker color used when a tanod has no active patrol or the area is unknown.
pub const DEFAULT_MARKER_COLOR: &str = "red";

/// A geofenced patrol zone with its boundary polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PatrolArea {
    pub id: String,
    /// Ordered boundary vertices (implicitly closed)
    #[serde(alias = "coordinates")]
    pub vertices: Vec<LatLng>,
    /// Display color, also used as the tanod's map marker color
    pub color: String,
    /// Human-readable label (e.g., "Purok 3")
    pub legend: String,
}

impl PatrolArea {
    /// Whether the area has enough vertices to act as a geofence.
    pub fn has_geometry(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Check whether a point lies inside this area (boundary inclusive).
    pub fn contains(&self, point: LatLng) -> bool {
        point_in_polygon(point, &self.vertices)
    }
}

/// Reference from a schedule to its patrol area.
///
/// Payloads carry either a bare area id or the embedded area. The store
/// hydrates ids into `Resolved` once on load; code past that boundary reads
/// through [`PatrolAreaRef::area`] and never inspects the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PatrolAreaRef {
    Resolved(PatrolArea),
    Id(String),
}

impl PatrolAreaRef {
    pub fn area_id(&self) -> &str {
        match self {
            PatrolAreaRef::Resolved(area) => &area.id,
            PatrolAreaRef::Id(id) => id,
        }
    }

    /// The hydrated area, if the reference could be resolved.
    pub fn area(&self) -> Option<&PatrolArea> {
        match self {
            PatrolAreaRef::Resolved(area) => Some(area),
            PatrolAreaRef::Id(_) => None,
        }
    }
}
