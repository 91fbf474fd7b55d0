// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod assistance;
pub mod incident;
pub mod location;
pub mod patrol_area;
pub mod patrol_log;
pub mod schedule;
pub mod user;

pub use assistance::{AssistanceRequest, AssistanceStatus};
pub use incident::{IncidentClassification, IncidentReport, IncidentStatus};
pub use location::LocationSample;
pub use patrol_area::{PatrolArea, PatrolAreaRef, DEFAULT_MARKER_COLOR};
pub use patrol_log::PatrolLogEntry;
pub use schedule::{PatrolSchedule, PatrolStatus, PatrolStatusEntry};
pub use user::UserProfile;
