// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the patrol API.

use super::error::ClientError;
use crate::config::ClientConfig;
use crate::error::ErrorResponse;
use crate::geometry::LatLng;
use crate::models::{
    AssistanceRequest, IncidentReport, IncidentStatus, LocationSample, PatrolLogEntry,
    PatrolSchedule, UserProfile,
};
use serde::{Deserialize, Serialize};

/// Patrol API client authenticated as one user.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct LocationUpdateResponse {
    applied: bool,
}

#[derive(Deserialize)]
struct PatrolStatusResponse {
    cleared: bool,
}

#[derive(Deserialize)]
struct SavePatrolLogsResponse {
    saved: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePatrolLogsBody<'a> {
    schedule_id: &'a str,
    logs: &'a [PatrolLogEntry],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IncidentStatusBody<'a> {
    status: IncidentStatus,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a str>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &ClientConfig, token: impl Into<String>) -> Self {
        Self::new(config.api_url.clone(), token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get the signed-in user's profile.
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.get_json("/api/me").await
    }

    /// Schedules the tanod can still start or end.
    pub async fn active_schedules(&self, tanod_id: &str) -> Result<Vec<PatrolSchedule>, ClientError> {
        self.get_json(&format!("/api/schedules/{}", tanod_id)).await
    }

    pub async fn start_patrol(
        &self,
        schedule_id: &str,
        location: LatLng,
    ) -> Result<PatrolSchedule, ClientError> {
        let body = serde_json::json!({
            "latitude": location.lat,
            "longitude": location.lng,
        });
        let response = self
            .http
            .put(self.url(&format!("/api/schedule/{}/start-patrol", schedule_id)))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        check_response_json(response).await
    }

    pub async fn end_patrol(&self, schedule_id: &str) -> Result<PatrolSchedule, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/api/schedule/{}/end-patrol", schedule_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        check_response_json(response).await
    }

    /// Post a location sample. Returns false if the server already had a
    /// newer one.
    pub async fn update_location(&self, sample: &LocationSample) -> Result<bool, ClientError> {
        let response: LocationUpdateResponse = self.post_json("/api/locations/update", sample).await?;
        Ok(response.applied)
    }

    /// Clear the on-patrol marker after ending a patrol.
    pub async fn clear_patrol_status(&self, ended_patrol_id: &str) -> Result<bool, ClientError> {
        let body = serde_json::json!({ "endedPatrolId": ended_patrol_id });
        let response: PatrolStatusResponse =
            self.post_json("/api/locations/patrol-status", &body).await?;
        Ok(response.cleared)
    }

    pub async fn save_patrol_logs(
        &self,
        schedule_id: &str,
        logs: &[PatrolLogEntry],
    ) -> Result<usize, ClientError> {
        let body = SavePatrolLogsBody { schedule_id, logs };
        let response: SavePatrolLogsResponse = self.post_json("/api/save-patrol-logs", &body).await?;
        Ok(response.saved)
    }

    pub async fn claim_incident(
        &self,
        incident_id: &str,
        user_id: &str,
    ) -> Result<IncidentReport, ClientError> {
        self.put_incident_status(
            incident_id,
            &IncidentStatusBody {
                status: IncidentStatus::InProgress,
                user_id,
                log: None,
            },
        )
        .await
    }

    pub async fn resolve_incident(
        &self,
        incident_id: &str,
        user_id: &str,
        log: &str,
    ) -> Result<IncidentReport, ClientError> {
        self.put_incident_status(
            incident_id,
            &IncidentStatusBody {
                status: IncidentStatus::Resolved,
                user_id,
                log: Some(log),
            },
        )
        .await
    }

    pub async fn request_assistance(&self, incident_id: &str) -> Result<AssistanceRequest, ClientError> {
        let body = serde_json::json!({ "incidentId": incident_id });
        self.post_json("/api/assistance-requests/create", &body).await
    }

    pub async fn assistance_status(&self, incident_id: &str) -> Result<AssistanceRequest, ClientError> {
        self.get_json(&format!("/api/assistance-requests/{}/status", incident_id))
            .await
    }

    async fn put_incident_status(
        &self,
        incident_id: &str,
        body: &IncidentStatusBody<'_>,
    ) -> Result<IncidentReport, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/api/incident-reports/{}/status", incident_id)))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        check_response_json(response).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;

        check_response_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
///
/// Error bodies are decoded as `{error, details}` so callers can match on
/// the server's error code.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => ClientError::Api {
            status,
            message: parsed.details.unwrap_or_else(|| parsed.error.clone()),
            code: parsed.error,
        },
        Err(_) => ClientError::Api {
            status,
            code: format!("http_{}", status),
            message: if body.is_empty() {
                format!("Request failed with status {}", status)
            } else {
                body.to_string()
            },
        },
    }
}
