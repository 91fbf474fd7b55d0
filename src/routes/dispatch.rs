// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes called by the external dispatch service.
//!
//! Authenticated with the dispatch shared secret, not tanod JWTs.
//! The auth middleware is applied in routes/mod.rs.

use super::api::publish_assistance_update;
use crate::error::Result;
use crate::models::{AssistanceRequest, AssistanceStatus};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/dispatch/assistance-requests/{incident_id}/status",
        put(update_assistance_status),
    )
}

#[derive(Debug, Deserialize)]
struct AssistanceStatusRequest {
    status: AssistanceStatus,
}

/// Status change reported by the dispatch service.
async fn update_assistance_status(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<String>,
    Json(body): Json<AssistanceStatusRequest>,
) -> Result<Json<AssistanceRequest>> {
    let request = state.incident_coordinator.update_assistance_status(
        &incident_id,
        body.status,
        Utc::now(),
    )?;
    publish_assistance_update(&state, &request, "update")?;
    Ok(Json(request))
}
