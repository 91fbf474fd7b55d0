// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::incident::IncidentError;
use crate::services::patrol::PatrolError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Patrol(#[from] PatrolError),

    #[error(transparent)]
    Incident(#[from] IncidentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Patrol(err) => (patrol_status(err), err.code(), Some(err.to_string())),
            AppError::Incident(err) => (incident_status(err), err.code(), Some(err.to_string())),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

fn patrol_status(err: &PatrolError) -> StatusCode {
    match err {
        PatrolError::NotFound(_) => StatusCode::NOT_FOUND,
        PatrolError::NotAssigned { .. } => StatusCode::FORBIDDEN,
        PatrolError::OutsideGeofence { .. } => StatusCode::FORBIDDEN,
        PatrolError::TooEarly { .. } | PatrolError::MissingAreaData { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PatrolError::AlreadyEnded { .. } | PatrolError::PatrolNotStarted { .. } => {
            StatusCode::CONFLICT
        }
    }
}

fn incident_status(err: &IncidentError) -> StatusCode {
    match err {
        IncidentError::NotFound(_) => StatusCode::NOT_FOUND,
        IncidentError::EmptyLog => StatusCode::BAD_REQUEST,
        IncidentError::NotResponder => StatusCode::FORBIDDEN,
        IncidentError::AlreadyClaimed { .. }
        | IncidentError::ResponderBusy { .. }
        | IncidentError::NotInProgress { .. }
        | IncidentError::AssistanceAlreadyRequested
        | IncidentError::InvalidAssistanceTransition { .. } => StatusCode::CONFLICT,
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
