// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod dispatch;
pub mod realtime;

use crate::middleware::{
    auth::require_auth, dispatch_auth::require_dispatch_auth, security::add_security_headers,
};
use crate::realtime::Room;
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, request::Parts, HeaderValue, Method, Request};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    /// Geofences currently loaded
    pub patrol_areas: usize,
    /// Dashboards listening on the tracking room
    pub tracking_listeners: usize,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
        patrol_areas: state.db.list_patrol_areas().len(),
        tracking_listeners: state.hub.subscriber_count(Room::Tracking),
    })
}

/// Origins allowed to call the API with credentials: the configured
/// dashboard plus local dev servers.
fn is_allowed_origin(frontend_url: &str, origin: &str) -> bool {
    origin == frontend_url
        || origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(&frontend_url, origin))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Request span with the path only; the query may carry a token.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The WebSocket upgrade authenticates the same way as the REST API
    let authenticated = api::routes()
        .merge(realtime::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let dispatch_routes = dispatch::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_dispatch_auth,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(authenticated)
        .merge(dispatch_routes)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
