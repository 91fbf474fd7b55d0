// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geofence geometry: point-in-polygon containment and haversine distance.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Mean Earth radius used for movement filtering.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Tolerance for treating a point as lying on a polygon edge (degrees²).
const EDGE_EPSILON: f64 = 1e-12;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<geo::Coord<f64>> for LatLng {
    /// GeoJSON coordinates are (x = longitude, y = latitude).
    fn from(coord: geo::Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

impl From<LatLng> for geo::Coord<f64> {
    fn from(point: LatLng) -> Self {
        geo::Coord {
            x: point.lng,
            y: point.lat,
        }
    }
}

/// Test whether `point` lies inside the polygon described by `vertices`.
///
/// Uses ray casting on the implicitly closed ring. A repeated closing vertex
/// is allowed but not required. Fewer than three vertices never contain
/// anything. Points on an edge or vertex count as inside.
pub fn point_in_polygon(point: LatLng, vertices: &[LatLng]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (vertices[i].lng, vertices[i].lat);
        let (xj, yj) = (vertices[j].lng, vertices[j].lat);

        if on_segment(x, y, xi, yi, xj, yj) {
            return true;
        }

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn on_segment(x: f64, y: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    let cross = (x - x1) * (y2 - y1) - (y - y1) * (x2 - x1);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    x >= x1.min(x2) && x <= x1.max(x2) && y >= y1.min(y2) && y <= y1.max(y2)
}

/// Great-circle distance in meters between two coordinates.
pub fn haversine_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance between two [`LatLng`] points in meters.
pub fn distance_between(a: LatLng, b: LatLng) -> f64 {
    haversine_distance_meters(a.lat, a.lng, b.lat, b.lng)
}
