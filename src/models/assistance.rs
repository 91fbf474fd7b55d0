// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Assistance (dispatch escalation) requests linked to incidents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Dispatch-side status of an assistance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AssistanceStatus {
    Pending,
    Processing,
    Deployed,
    Rejected,
    Completed,
}

impl AssistanceStatus {
    /// Transitions the dispatch system may perform.
    pub fn can_transition_to(self, next: AssistanceStatus) -> bool {
        use AssistanceStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Deployed)
                | (Deployed, Completed)
                | (Pending, Rejected)
                | (Processing, Rejected)
        )
    }
}

/// An escalation of one incident to the external dispatch service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AssistanceRequest {
    pub id: String,
    pub incident_id: String,
    pub requester_id: String,
    pub status: AssistanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
