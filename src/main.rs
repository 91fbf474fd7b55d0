// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tanod Patrol API Server
//!
//! Tracks barangay tanod patrols: geofenced patrol starts, live locations on
//! the admin map, and incident response claims.

use std::sync::Arc;
use tanod_patrol::{
    config::Config, db::MemoryDb, realtime::Hub, services::PatrolAreaService, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Tanod Patrol API");

    let db = MemoryDb::new();

    // Seed patrol area boundaries
    if let Some(path) = &config.patrol_areas_path {
        tracing::info!(path = %path, "Loading patrol areas");
        let areas = PatrolAreaService::load_from_file(path).expect("Failed to load patrol areas");
        let count = areas.areas().len();
        for area in areas.into_areas() {
            db.upsert_patrol_area(area);
        }
        tracing::info!(count, "Patrol areas loaded");
    } else {
        tracing::warn!("PATROL_AREAS_PATH not set; patrols cannot start until areas are added");
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, Hub::default()));

    // Build router
    let app = tanod_patrol::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tanod_patrol=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
