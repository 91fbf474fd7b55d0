// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Patrol area boundary loading from GeoJSON.

use crate::geometry::LatLng;
use crate::models::PatrolArea;
use geo::Polygon;
use geojson::GeoJson;
use std::fs;
use std::path::Path;

/// Loads patrol area boundaries drawn in the admin mapping tool.
#[derive(Default, Clone)]
pub struct PatrolAreaService {
    areas: Vec<PatrolArea>,
}

impl PatrolAreaService {
    /// Load areas from a GeoJSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PatrolAreaError> {
        let json_data = fs::read_to_string(path.as_ref())
            .map_err(|e| PatrolAreaError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load areas from a GeoJSON FeatureCollection string.
    ///
    /// Each feature needs an `id` property and a Polygon geometry; `color`
    /// and `legend` are optional.
    pub fn load_from_json(json_data: &str) -> Result<Self, PatrolAreaError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| PatrolAreaError::ParseError(e.to_string()))?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(PatrolAreaError::ParseError(
                "expected a FeatureCollection".to_string(),
            ));
        };

        let mut areas = Vec::new();

        for feature in collection.features {
            let Some(id) = feature
                .property("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                tracing::warn!("Skipping patrol area feature without an id");
                continue;
            };

            let color = feature
                .property("color")
                .and_then(|v| v.as_str())
                .unwrap_or(crate::models::DEFAULT_MARKER_COLOR)
                .to_string();

            let legend = feature
                .property("legend")
                .and_then(|v| v.as_str())
                .unwrap_or(&id)
                .to_string();

            let Some(geom) = feature.geometry else {
                tracing::warn!(area_id = %id, "Skipping patrol area without geometry");
                continue;
            };

            let vertices = Self::exterior_vertices(geom.value)?;
            areas.push(PatrolArea {
                id,
                vertices,
                color,
                legend,
            });
        }

        tracing::info!(count = areas.len(), "Loaded patrol areas");
        Ok(Self { areas })
    }

    /// Convert a GeoJSON polygon into its exterior ring, minus the closing vertex.
    fn exterior_vertices(value: geojson::Value) -> Result<Vec<LatLng>, PatrolAreaError> {
        let polygon: Polygon<f64> = value
            .try_into()
            .map_err(|_| PatrolAreaError::UnsupportedGeometry)?;

        let mut vertices: Vec<LatLng> = polygon.exterior().coords().map(|c| (*c).into()).collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Ok(vertices)
    }

    pub fn areas(&self) -> &[PatrolArea] {
        &self.areas
    }

    pub fn into_areas(self) -> Vec<PatrolArea> {
        self.areas
    }
}

/// Errors from patrol area loading.
#[derive(Debug, thiserror::Error)]
pub enum PatrolAreaError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),

    #[error("Unsupported geometry type (expected Polygon)")]
    UnsupportedGeometry,
}
