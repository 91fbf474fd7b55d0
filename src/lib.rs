// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tanod Patrol: realtime patrol tracking for barangay community patrols
//!
//! This crate provides the backend API for patrol-area geofencing, live
//! tanod location tracking, and incident response coordination, plus the
//! device-side client that samples locations and keeps the realtime
//! channel connected.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::MemoryDb;
use realtime::Hub;
use services::{IncidentCoordinator, PatrolService, TrackingService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: MemoryDb,
    pub hub: Hub,
    pub patrol_service: PatrolService,
    pub tracking_service: TrackingService,
    pub incident_coordinator: IncidentCoordinator,
}

impl AppState {
    /// Wire up services over a shared store and hub.
    pub fn new(config: Config, db: MemoryDb, hub: Hub) -> Self {
        let patrol_service = PatrolService::new(db.clone(), config.start_window);
        let tracking_service = TrackingService::new(db.clone(), hub.clone());
        let incident_coordinator = IncidentCoordinator::new(db.clone());

        Self {
            config,
            db,
            hub,
            patrol_service,
            tracking_service,
            incident_coordinator,
        }
    }
}
