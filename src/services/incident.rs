// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incident response coordination.
//!
//! One tanod claims an incident (`Pending` → `In Progress`) and the same
//! tanod resolves it with a log (`In Progress` → `Resolved`). A tanod holds
//! at most one `In Progress` incident, enforced by a per-tanod responder
//! slot reserved before the write. Claim conflicts are settled by
//! re-checking the status under the incident's lock at write time.
//!
//! Assistance requests escalate an incident to the external dispatch
//! service; their status never changes the incident's own status.

use crate::db::MemoryDb;
use crate::models::{
    AssistanceRequest, AssistanceStatus, IncidentReport, IncidentStatus, UserProfile,
};
use chrono::{DateTime, Utc};

/// Errors from incident transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncidentError {
    #[error("Incident {0} not found")]
    NotFound(String),

    #[error("{}", already_claimed_message(.responder_name))]
    AlreadyClaimed { responder_name: Option<String> },

    #[error("You are already responding to another incident")]
    ResponderBusy { incident_id: String },

    #[error("A resolution log is required")]
    EmptyLog,

    #[error("Incident is {status:?}, not in progress")]
    NotInProgress { status: IncidentStatus },

    #[error("Only the responding tanod can resolve this incident")]
    NotResponder,

    #[error("Assistance has already been requested for this incident")]
    AssistanceAlreadyRequested,

    #[error("Cannot change assistance status from {from:?} to {to:?}")]
    InvalidAssistanceTransition {
        from: AssistanceStatus,
        to: AssistanceStatus,
    },
}

fn already_claimed_message(responder_name: &Option<String>) -> String {
    match responder_name {
        Some(name) => format!("{} is already responding to this incident", name),
        None => "Someone else is already responding to this incident".to_string(),
    }
}

impl IncidentError {
    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            IncidentError::NotFound(_) => "not_found",
            IncidentError::AlreadyClaimed { .. } => "already_claimed",
            IncidentError::ResponderBusy { .. } => "responder_busy",
            IncidentError::EmptyLog => "empty_log",
            IncidentError::NotInProgress { .. } => "not_in_progress",
            IncidentError::NotResponder => "not_responder",
            IncidentError::AssistanceAlreadyRequested => "assistance_already_requested",
            IncidentError::InvalidAssistanceTransition { .. } => "invalid_assistance_transition",
        }
    }
}

/// Coordinates claims, resolutions and assistance escalation.
#[derive(Clone)]
pub struct IncidentCoordinator {
    db: MemoryDb,
}

impl IncidentCoordinator {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }

    /// Whether the tanod currently holds an `In Progress` incident.
    pub fn has_active_response(&self, tanod_id: &str) -> bool {
        self.db.active_incident_for(tanod_id).is_some()
    }

    /// Claim an incident for a tanod.
    ///
    /// Re-claiming an incident the tanod already holds is a no-op.
    pub fn claim(
        &self,
        incident_id: &str,
        tanod: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<IncidentReport, IncidentError> {
        if let Some(active) = self.db.active_incident_for(&tanod.id) {
            if active.id == incident_id {
                return Ok(active);
            }
            return Err(IncidentError::ResponderBusy {
                incident_id: active.id,
            });
        }

        // The scan above can race with this tanod's own concurrent claim on
        // another incident; the slot reservation cannot.
        if let Err(held) = self.db.reserve_responder(&tanod.id, incident_id) {
            tracing::info!(incident_id, tanod_id = %tanod.id, held = %held, "Responder busy");
            return Err(IncidentError::ResponderBusy { incident_id: held });
        }

        let claimed = self
            .db
            .update_incident(incident_id, |incident| match incident.status {
                IncidentStatus::Pending => {
                    incident.status = IncidentStatus::InProgress;
                    incident.responder_id = Some(tanod.id.clone());
                    incident.responder_name = Some(tanod.display_name());
                    incident.updated_at = now;
                    Ok(incident.clone())
                }
                IncidentStatus::InProgress if incident.is_held_by(&tanod.id) => {
                    Ok(incident.clone())
                }
                IncidentStatus::InProgress => Err(IncidentError::AlreadyClaimed {
                    responder_name: incident.responder_name.clone(),
                }),
                IncidentStatus::Resolved => Err(IncidentError::NotInProgress {
                    status: IncidentStatus::Resolved,
                }),
            })
            .unwrap_or_else(|| Err(IncidentError::NotFound(incident_id.to_string())));

        if claimed.is_err() {
            self.db.release_responder(&tanod.id, incident_id);
        }

        match &claimed {
            Ok(_) => tracing::info!(incident_id, tanod_id = %tanod.id, "Incident claimed"),
            Err(e) => tracing::info!(
                incident_id,
                tanod_id = %tanod.id,
                reason = e.code(),
                "Incident claim rejected"
            ),
        }
        claimed
    }

    /// Resolve an incident with a mandatory log entry.
    pub fn resolve(
        &self,
        incident_id: &str,
        tanod_id: &str,
        log: &str,
        now: DateTime<Utc>,
    ) -> Result<IncidentReport, IncidentError> {
        let log = log.trim();
        if log.is_empty() {
            return Err(IncidentError::EmptyLog);
        }

        let resolved = self
            .db
            .update_incident(incident_id, |incident| {
                if incident.status != IncidentStatus::InProgress {
                    return Err(IncidentError::NotInProgress {
                        status: incident.status,
                    });
                }
                if !incident.is_held_by(tanod_id) {
                    return Err(IncidentError::NotResponder);
                }

                incident.status = IncidentStatus::Resolved;
                incident.log = Some(log.to_string());
                incident.updated_at = now;
                Ok(incident.clone())
            })
            .unwrap_or_else(|| Err(IncidentError::NotFound(incident_id.to_string())))?;

        self.db.release_responder(tanod_id, incident_id);
        tracing::info!(incident_id, tanod_id, "Incident resolved");
        Ok(resolved)
    }

    /// Escalate an incident to the dispatch service.
    pub fn request_assistance(
        &self,
        incident_id: &str,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AssistanceRequest, IncidentError> {
        if self.db.get_incident(incident_id).is_none() {
            return Err(IncidentError::NotFound(incident_id.to_string()));
        }

        let request = AssistanceRequest {
            id: format!("{}-assistance", incident_id),
            incident_id: incident_id.to_string(),
            requester_id: requester_id.to_string(),
            status: AssistanceStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        if !self.db.insert_assistance_request(request.clone()) {
            return Err(IncidentError::AssistanceAlreadyRequested);
        }

        tracing::info!(incident_id, requester_id, "Assistance requested");
        Ok(request)
    }

    /// Current assistance request for an incident, if any.
    pub fn assistance_status(&self, incident_id: &str) -> Option<AssistanceRequest> {
        self.db.get_assistance_request(incident_id)
    }

    /// Apply a status change reported by the dispatch service.
    pub fn update_assistance_status(
        &self,
        incident_id: &str,
        status: AssistanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AssistanceRequest, IncidentError> {
        let updated = self
            .db
            .update_assistance_request(incident_id, |request| {
                if !request.status.can_transition_to(status) {
                    return Err(IncidentError::InvalidAssistanceTransition {
                        from: request.status,
                        to: status,
                    });
                }
                request.status = status;
                request.updated_at = now;
                Ok(request.clone())
            })
            .unwrap_or_else(|| Err(IncidentError::NotFound(incident_id.to_string())))?;

        tracing::info!(incident_id, status = ?status, "Assistance status updated");
        Ok(updated)
    }
}
