// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::geometry::LatLng;
use crate::middleware::auth::AuthUser;
use crate::models::{
    AssistanceRequest, IncidentReport, IncidentStatus, LocationSample, PatrolLogEntry,
    PatrolSchedule, UserProfile,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/schedules", get(list_schedules))
        .route("/api/schedules/{tanod_id}", get(get_active_schedules))
        .route("/api/schedule/{id}/start-patrol", put(start_patrol))
        .route("/api/schedule/{id}/end-patrol", put(end_patrol))
        .route("/api/locations/update", post(update_location))
        .route("/api/locations/active", get(get_active_locations))
        .route("/api/locations/patrol-status", post(clear_patrol_status))
        .route("/api/incident-reports", get(list_incidents))
        .route("/api/incident-reports/active", get(get_active_response))
        .route("/api/incident-reports/{id}/status", put(update_incident_status))
        .route("/api/assistance-requests/create", post(create_assistance_request))
        .route(
            "/api/assistance-requests/{incident_id}/status",
            get(get_assistance_status),
        )
        .route("/api/save-patrol-logs", post(save_patrol_logs))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(profile))
}

// ─── Schedules & Patrols ─────────────────────────────────────

/// All schedules, for the admin schedule view.
async fn list_schedules(State(state): State<Arc<AppState>>) -> Json<Vec<PatrolSchedule>> {
    Json(state.db.list_schedules())
}

/// Schedules a tanod still has start/end controls for.
async fn get_active_schedules(
    State(state): State<Arc<AppState>>,
    Path(tanod_id): Path<String>,
) -> Json<Vec<PatrolSchedule>> {
    Json(
        state
            .patrol_service
            .active_schedules_for(&tanod_id, Utc::now()),
    )
}

#[derive(Debug, Deserialize, Validate)]
struct StartPatrolRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

async fn start_patrol(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<String>,
    Json(body): Json<StartPatrolRequest>,
) -> Result<Json<PatrolSchedule>> {
    body.validate()?;

    let schedule = state.patrol_service.start_patrol(
        &schedule_id,
        &user.user_id,
        LatLng::new(body.latitude, body.longitude),
        Utc::now(),
    )?;
    Ok(Json(schedule))
}

async fn end_patrol(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<String>,
) -> Result<Json<PatrolSchedule>> {
    let schedule = state
        .patrol_service
        .end_patrol(&schedule_id, &user.user_id)?;
    Ok(Json(schedule))
}

// ─── Locations ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationUpdateResponse {
    /// False when the sample was older than the stored one.
    pub applied: bool,
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(sample): Json<LocationSample>,
) -> Result<Json<LocationUpdateResponse>> {
    let applied = state
        .tracking_service
        .record_location(&user.user_id, sample)?;
    Ok(Json(LocationUpdateResponse { applied }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveLocationsQuery {
    #[serde(default)]
    on_patrol: bool,
}

async fn get_active_locations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveLocationsQuery>,
) -> Json<Vec<LocationSample>> {
    Json(state.tracking_service.active_locations(params.on_patrol))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatrolStatusRequest {
    ended_patrol_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PatrolStatusResponse {
    pub cleared: bool,
    pub location: Option<LocationSample>,
}

/// Clear the caller's on-patrol marker after a patrol ends.
async fn clear_patrol_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<PatrolStatusRequest>,
) -> Json<PatrolStatusResponse> {
    let location = state.tracking_service.clear_patrol_status(
        &user.user_id,
        &body.ended_patrol_id,
        Utc::now(),
    );
    Json(PatrolStatusResponse {
        cleared: location.is_some(),
        location,
    })
}

// ─── Incidents ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IncidentsQuery {
    status: Option<IncidentStatus>,
}

/// Incident reports, newest first, optionally filtered by status.
async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IncidentsQuery>,
) -> Json<Vec<IncidentReport>> {
    let incidents = state
        .db
        .list_incidents()
        .into_iter()
        .filter(|i| params.status.map_or(true, |s| i.status == s))
        .collect();
    Json(incidents)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActiveResponseResponse {
    pub has_active_response: bool,
    pub incident_id: Option<String>,
}

/// Whether the caller is already responding to an incident.
async fn get_active_response(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<ActiveResponseResponse> {
    let active = state.db.active_incident_for(&user.user_id);
    Json(ActiveResponseResponse {
        has_active_response: active.is_some(),
        incident_id: active.map(|i| i.id),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncidentStatusRequest {
    status: IncidentStatus,
    user_id: Option<String>,
    #[serde(default)]
    log: Option<String>,
}

/// Claim (`In Progress`) or resolve (`Resolved`) an incident.
async fn update_incident_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(incident_id): Path<String>,
    Json(body): Json<IncidentStatusRequest>,
) -> Result<Json<IncidentReport>> {
    if body.user_id.as_deref().is_some_and(|id| id != user.user_id) {
        return Err(AppError::Forbidden(
            "Cannot respond on behalf of another user".to_string(),
        ));
    }

    let now = Utc::now();
    let incident = match body.status {
        IncidentStatus::InProgress => {
            let profile = state
                .db
                .get_user(&user.user_id)
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
            state
                .incident_coordinator
                .claim(&incident_id, &profile, now)?
        }
        IncidentStatus::Resolved => state.incident_coordinator.resolve(
            &incident_id,
            &user.user_id,
            body.log.as_deref().unwrap_or_default(),
            now,
        )?,
        IncidentStatus::Pending => {
            return Err(AppError::BadRequest(
                "An incident cannot be returned to Pending".to_string(),
            ))
        }
    };

    Ok(Json(incident))
}

// ─── Assistance Requests ─────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssistanceRequest {
    incident_id: String,
}

async fn create_assistance_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateAssistanceRequest>,
) -> Result<Json<AssistanceRequest>> {
    let request = state.incident_coordinator.request_assistance(
        &body.incident_id,
        &user.user_id,
        Utc::now(),
    )?;
    publish_assistance_update(&state, &request, "create")?;
    Ok(Json(request))
}

async fn get_assistance_status(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<String>,
) -> Result<Json<AssistanceRequest>> {
    let request = state
        .incident_coordinator
        .assistance_status(&incident_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("No assistance request for incident {}", incident_id))
        })?;
    Ok(Json(request))
}

/// Announce an assistance request change as a `vehicleRequestUpdate`.
pub(crate) fn publish_assistance_update(
    state: &AppState,
    request: &AssistanceRequest,
    action: &str,
) -> Result<()> {
    let payload = serde_json::to_value(request).map_err(anyhow::Error::from)?;
    let receivers = state.hub.publish_vehicle_request(payload, action);
    tracing::debug!(
        incident_id = %request.incident_id,
        action,
        receivers,
        "Published assistance request update"
    );
    Ok(())
}

// ─── Patrol Logs ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePatrolLogsRequest {
    schedule_id: String,
    logs: Vec<PatrolLogEntry>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavePatrolLogsResponse {
    pub saved: usize,
    pub total: usize,
}

/// Flush a tanod's buffered patrol reports for a schedule.
async fn save_patrol_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SavePatrolLogsRequest>,
) -> Result<Json<SavePatrolLogsResponse>> {
    let schedule = state
        .db
        .get_schedule(&body.schedule_id)
        .ok_or_else(|| AppError::NotFound(format!("Schedule {} not found", body.schedule_id)))?;
    if !schedule.is_assigned(&user.user_id) {
        return Err(AppError::Forbidden(
            "You are not assigned to this patrol schedule".to_string(),
        ));
    }

    let saved = body.logs.len();
    let total = state.db.append_patrol_logs(&body.schedule_id, body.logs);
    tracing::info!(
        schedule_id = %body.schedule_id,
        tanod_id = %user.user_id,
        saved,
        total,
        "Patrol logs saved"
    );

    Ok(Json(SavePatrolLogsResponse { saved, total }))
}
