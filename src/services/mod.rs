// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod incident;
pub mod patrol;
pub mod patrol_area;
pub mod tracking;

pub use incident::{IncidentCoordinator, IncidentError};
pub use patrol::{PatrolError, PatrolService};
pub use patrol_area::{PatrolAreaError, PatrolAreaService};
pub use tracking::TrackingService;
