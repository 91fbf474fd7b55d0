// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tanod_patrol::config::Config;
use tanod_patrol::db::MemoryDb;
use tanod_patrol::geometry::LatLng;
use tanod_patrol::middleware::auth::create_jwt;
use tanod_patrol::models::{
    IncidentClassification, IncidentReport, IncidentStatus, PatrolArea, PatrolAreaRef,
    PatrolSchedule, UserProfile,
};
use tanod_patrol::realtime::Hub;
use tanod_patrol::routes::create_router;
use tanod_patrol::AppState;

/// A point inside [`square_area`].
#[allow(dead_code)]
pub const INSIDE: LatLng = LatLng {
    lat: 14.55,
    lng: 121.05,
};

/// A point well outside [`square_area`].
#[allow(dead_code)]
pub const OUTSIDE: LatLng = LatLng {
    lat: 15.0,
    lng: 121.0,
};

/// Create a test app over an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        MemoryDb::new(),
        Hub::default(),
    ));
    (create_router(state.clone()), state)
}

/// Serve the app on an ephemeral local port. Returns the base URL.
#[allow(dead_code)]
pub async fn spawn_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Create a test JWT token for a user.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, state: &AppState) -> String {
    create_jwt(user_id, &state.config.jwt_signing_key).unwrap()
}

#[allow(dead_code)]
pub fn seed_user(state: &AppState, id: &str, first_name: &str, last_name: &str) {
    state.db.upsert_user(UserProfile {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        profile_picture: None,
    });
}

/// Square patrol area spanning 14.5..14.6 N, 121.0..121.1 E.
#[allow(dead_code)]
pub fn square_area(id: &str, legend: &str, color: &str) -> PatrolArea {
    PatrolArea {
        id: id.to_string(),
        vertices: vec![
            LatLng::new(14.5, 121.0),
            LatLng::new(14.5, 121.1),
            LatLng::new(14.6, 121.1),
            LatLng::new(14.6, 121.0),
        ],
        color: color.to_string(),
        legend: legend.to_string(),
    }
}

/// Schedule referencing an area by id, as it arrives from the store.
#[allow(dead_code)]
pub fn schedule(
    id: &str,
    tanods: &[&str],
    start_time: DateTime<Utc>,
    area_id: Option<&str>,
) -> PatrolSchedule {
    PatrolSchedule {
        id: id.to_string(),
        unit: "Unit Alpha".to_string(),
        start_time,
        end_time: start_time + Duration::hours(4),
        tanods: tanods.iter().map(|t| t.to_string()).collect(),
        patrol_area: area_id.map(|a| PatrolAreaRef::Id(a.to_string())),
        patrol_status: Vec::new(),
    }
}

#[allow(dead_code)]
pub fn incident(id: &str) -> IncidentReport {
    IncidentReport {
        id: id.to_string(),
        incident_type: "Disturbance".to_string(),
        incident_classification: IncidentClassification::Emergency,
        description: "Loud altercation near the chapel".to_string(),
        location: "Lat: 14.55, Lon: 121.05".to_string(),
        address: None,
        status: IncidentStatus::Pending,
        responder_id: None,
        responder_name: None,
        log: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build an authenticated JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a dispatch-service JSON request carrying the shared key.
#[allow(dead_code)]
pub fn dispatch_request(uri: &str, key: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(tanod_patrol::middleware::dispatch_auth::DISPATCH_KEY_HEADER, key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build an authenticated request without a body.
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
