// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end patrol lifecycle through the HTTP API.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use tanod_patrol::error::ErrorResponse;
use tanod_patrol::models::{LocationSample, PatrolSchedule, PatrolStatus};
use tanod_patrol::realtime::{Room, ServerEvent};
use tower::ServiceExt;

mod common;

use common::{INSIDE, OUTSIDE};

fn start_body(point: tanod_patrol::geometry::LatLng) -> serde_json::Value {
    json!({ "latitude": point.lat, "longitude": point.lng })
}

fn location_body(user_id: &str, schedule_id: Option<&str>, color: &str) -> serde_json::Value {
    json!({
        "userId": user_id,
        "latitude": INSIDE.lat,
        "longitude": INSIDE.lng,
        "currentScheduleId": schedule_id,
        "markerColor": color,
        "isOnPatrol": schedule_id.is_some(),
        "lastUpdate": Utc::now(),
    })
}

#[tokio::test]
async fn test_full_patrol_lifecycle() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_patrol_area(common::square_area("a1", "Purok 3", "blue"));
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now() - Duration::minutes(10),
        Some("a1"),
    ));
    let token = common::create_test_jwt("t1", &state);
    let mut tracking = state.hub.subscribe(Room::Tracking);

    // Start from inside the area
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(INSIDE),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schedule: PatrolSchedule = common::body_json(response).await;
    assert_eq!(schedule.status_for("t1"), PatrolStatus::Started);

    // Post an on-patrol location
    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/locations/update",
            &token,
            location_body("t1", Some("s1"), "blue"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match tracking.recv().await.unwrap() {
        ServerEvent::LocationUpdate(sample) => {
            assert!(sample.is_on_patrol);
            assert_eq!(sample.marker_color, "blue");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/locations/active?onPatrol=true",
            &token,
        ))
        .await
        .unwrap();
    let on_patrol: Vec<LocationSample> = common::body_json(response).await;
    assert_eq!(on_patrol.len(), 1);

    // End the patrol, then clear the marker
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/schedule/s1/end-patrol",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schedule: PatrolSchedule = common::body_json(response).await;
    assert_eq!(schedule.status_for("t1"), PatrolStatus::Ended);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/locations/patrol-status",
            &token,
            json!({ "endedPatrolId": "s1" }),
        ))
        .await
        .unwrap();
    let body: serde_json::Value = common::body_json(response).await;
    assert_eq!(body["cleared"], true);
    assert_eq!(body["location"]["isOnPatrol"], false);
    assert_eq!(body["location"]["markerColor"], "red");

    match tracking.recv().await.unwrap() {
        ServerEvent::LocationUpdate(sample) => assert!(!sample.is_on_patrol),
        other => panic!("unexpected event: {:?}", other),
    }

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/locations/active?onPatrol=true",
            &token,
        ))
        .await
        .unwrap();
    let on_patrol: Vec<LocationSample> = common::body_json(response).await;
    assert!(on_patrol.is_empty());

    // An ended patrol cannot be restarted
    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(INSIDE),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_start_outside_geofence_names_area() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_patrol_area(common::square_area("a1", "Purok 3", "blue"));
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now(),
        Some("a1"),
    ));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(OUTSIDE),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "outside_geofence");
    assert!(body.details.unwrap().contains("Purok 3"));

    // Status unchanged
    let schedule = state.db.get_schedule("s1").unwrap();
    assert_eq!(schedule.status_for("t1"), PatrolStatus::NotStarted);
}

#[tokio::test]
async fn test_start_too_early() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_patrol_area(common::square_area("a1", "Purok 3", "blue"));
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now() + Duration::hours(2),
        Some("a1"),
    ));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(INSIDE),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "too_early");
}

#[tokio::test]
async fn test_start_with_unknown_area() {
    let (app, state) = common::create_test_app();
    // Area id that was never loaded stays unresolved
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now(),
        Some("missing-area"),
    ));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(INSIDE),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "missing_area_data");
}

#[tokio::test]
async fn test_start_rejects_invalid_coordinates() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_patrol_area(common::square_area("a1", "Purok 3", "blue"));
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now(),
        Some("a1"),
    ));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            json!({ "latitude": 95.0, "longitude": 121.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unassigned_tanod_cannot_start() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_patrol_area(common::square_area("a1", "Purok 3", "blue"));
    state.db.upsert_schedule(common::schedule(
        "s1",
        &["t1"],
        Utc::now(),
        Some("a1"),
    ));
    let token = common::create_test_jwt("t2", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/schedule/s1/start-patrol",
            &token,
            start_body(INSIDE),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "not_assigned");
}

#[tokio::test]
async fn test_location_update_for_other_user_forbidden() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/locations/update",
            &token,
            location_body("t2", None, "red"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.db.get_location("t2").is_none());
}

#[tokio::test]
async fn test_active_schedules_for_tanod() {
    let (app, state) = common::create_test_app();
    let now = Utc::now();
    state
        .db
        .upsert_schedule(common::schedule("current", &["t1"], now, None));
    // Ended hours ago and never started
    state.db.upsert_schedule(common::schedule(
        "past",
        &["t1"],
        now - Duration::hours(10),
        None,
    ));
    state
        .db
        .upsert_schedule(common::schedule("other", &["t2"], now, None));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::authed_request("GET", "/api/schedules/t1", &token))
        .await
        .unwrap();

    let schedules: Vec<PatrolSchedule> = common::body_json(response).await;
    let ids: Vec<&str> = schedules.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["current"]);
}

#[tokio::test]
async fn test_save_patrol_logs() {
    let (app, state) = common::create_test_app();
    state
        .db
        .upsert_schedule(common::schedule("s1", &["t1"], Utc::now(), None));
    let token = common::create_test_jwt("t1", &state);
    let logs = json!([
        { "timestamp": Utc::now(), "report": "Checked the basketball court" },
        { "timestamp": Utc::now(), "report": "All quiet at the market" },
    ]);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/save-patrol-logs",
            &token,
            json!({ "scheduleId": "s1", "logs": logs }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = common::body_json(response).await;
    assert_eq!(body["saved"], 2);
    assert_eq!(state.db.get_patrol_logs("s1").len(), 2);

    // Another tanod cannot write to this schedule
    let other = common::create_test_jwt("t2", &state);
    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/save-patrol-logs",
            &other,
            json!({ "scheduleId": "s1", "logs": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
