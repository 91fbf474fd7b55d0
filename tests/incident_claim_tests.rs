// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incident claim/resolve races and assistance escalation.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use std::sync::{Arc, Barrier};
use tanod_patrol::db::MemoryDb;
use tanod_patrol::error::ErrorResponse;
use tanod_patrol::models::{AssistanceRequest, IncidentReport, IncidentStatus, UserProfile};
use tanod_patrol::realtime::{Room, ServerEvent};
use tanod_patrol::services::{IncidentCoordinator, IncidentError};
use tower::ServiceExt;

mod common;

fn tanod(i: usize) -> UserProfile {
    UserProfile {
        id: format!("t{}", i),
        first_name: format!("Tanod{}", i),
        last_name: "Reyes".to_string(),
        profile_picture: None,
    }
}

#[test]
fn test_concurrent_claims_exactly_one_wins() {
    const CONTENDERS: usize = 8;

    for round in 0..20 {
        let db = MemoryDb::new();
        db.insert_incident(common::incident("i1"));
        let coordinator = IncidentCoordinator::new(db.clone());
        let barrier = Arc::new(Barrier::new(CONTENDERS));

        let results: Vec<Result<IncidentReport, IncidentError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..CONTENDERS)
                .map(|i| {
                    let coordinator = coordinator.clone();
                    let barrier = barrier.clone();
                    scope.spawn(move || {
                        barrier.wait();
                        coordinator.claim("i1", &tanod(i), Utc::now())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&IncidentReport> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "round {}: expected one winner", round);

        let winner_id = winners[0].responder_id.clone().unwrap();
        for result in &results {
            if let Err(err) = result {
                match err {
                    IncidentError::AlreadyClaimed { responder_name } => {
                        assert!(responder_name.is_some());
                    }
                    other => panic!("unexpected error: {:?}", other),
                }
            }
        }

        let stored = db.get_incident("i1").unwrap();
        assert_eq!(stored.status, IncidentStatus::InProgress);
        assert_eq!(stored.responder_id.as_deref(), Some(winner_id.as_str()));
    }
}

#[test]
fn test_same_tanod_concurrent_claims_hold_one_incident() {
    for round in 0..200 {
        let db = MemoryDb::new();
        db.insert_incident(common::incident("i1"));
        db.insert_incident(common::incident("i2"));
        let coordinator = IncidentCoordinator::new(db.clone());
        let barrier = Arc::new(Barrier::new(2));
        let responder = tanod(1);

        let results: Vec<Result<IncidentReport, IncidentError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["i1", "i2"]
                .into_iter()
                .map(|incident_id| {
                    let coordinator = coordinator.clone();
                    let barrier = barrier.clone();
                    let responder = &responder;
                    scope.spawn(move || {
                        barrier.wait();
                        coordinator.claim(incident_id, responder, Utc::now())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let won = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(won, 1, "round {}: expected exactly one claim", round);
        for result in &results {
            if let Err(err) = result {
                assert!(
                    matches!(err, IncidentError::ResponderBusy { .. }),
                    "round {}: unexpected error {:?}",
                    round,
                    err
                );
            }
        }

        let in_progress = db
            .list_incidents()
            .into_iter()
            .filter(|i| i.status == IncidentStatus::InProgress)
            .count();
        assert_eq!(in_progress, 1, "round {}: tanod holds {} incidents", round, in_progress);
    }
}

#[tokio::test]
async fn test_claim_conflict_over_api() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "t1", "Juan", "Dela Cruz");
    common::seed_user(&state, "t2", "Pedro", "Santos");
    state.db.insert_incident(common::incident("i1"));

    let first = common::create_test_jwt("t1", &state);
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &first,
            json!({ "status": "In Progress", "userId": "t1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let incident: IncidentReport = common::body_json(response).await;
    assert_eq!(incident.responder_name.as_deref(), Some("Juan Dela Cruz"));

    let second = common::create_test_jwt("t2", &state);
    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &second,
            json!({ "status": "In Progress", "userId": "t2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "already_claimed");
    assert_eq!(
        body.details.as_deref(),
        Some("Juan Dela Cruz is already responding to this incident")
    );
}

#[tokio::test]
async fn test_responder_busy_over_api() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "t1", "Juan", "Dela Cruz");
    state.db.insert_incident(common::incident("i1"));
    state.db.insert_incident(common::incident("i2"));
    let token = common::create_test_jwt("t1", &state);

    let claim = |id: &str| {
        common::json_request(
            "PUT",
            &format!("/api/incident-reports/{}/status", id),
            &token,
            json!({ "status": "In Progress" }),
        )
    };

    let response = app.clone().oneshot(claim("i1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/incident-reports/active",
            &token,
        ))
        .await
        .unwrap();
    let body: serde_json::Value = common::body_json(response).await;
    assert_eq!(body["hasActiveResponse"], true);
    assert_eq!(body["incidentId"], "i1");

    let response = app.oneshot(claim("i2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: ErrorResponse = common::body_json(response).await;
    assert_eq!(body.error, "responder_busy");
}

#[tokio::test]
async fn test_resolve_requires_log_over_api() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "t1", "Juan", "Dela Cruz");
    state.db.insert_incident(common::incident("i1"));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &token,
            json!({ "status": "In Progress" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &token,
            json!({ "status": "Resolved", "log": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        state.db.get_incident("i1").unwrap().status,
        IncidentStatus::InProgress
    );

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &token,
            json!({ "status": "Resolved", "log": "Parties separated; no injuries." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let incident: IncidentReport = common::body_json(response).await;
    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert_eq!(incident.log.as_deref(), Some("Parties separated; no injuries."));

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/incident-reports?status=Resolved",
            &token,
        ))
        .await
        .unwrap();
    let resolved: Vec<IncidentReport> = common::body_json(response).await;
    assert_eq!(resolved.len(), 1);
}

#[tokio::test]
async fn test_claim_on_behalf_of_other_user_forbidden() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "t1", "Juan", "Dela Cruz");
    state.db.insert_incident(common::incident("i1"));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/incident-reports/i1/status",
            &token,
            json!({ "status": "In Progress", "userId": "t2" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        state.db.get_incident("i1").unwrap().status,
        IncidentStatus::Pending
    );
}

#[tokio::test]
async fn test_assistance_request_broadcast() {
    let (app, state) = common::create_test_app();
    state.db.insert_incident(common::incident("i1"));
    let token = common::create_test_jwt("t1", &state);
    let mut dispatch = state.hub.subscribe(Room::VehicleRequests);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/assistance-requests/create",
            &token,
            json!({ "incidentId": "i1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match dispatch.recv().await.unwrap() {
        ServerEvent::VehicleRequestUpdate { request, action } => {
            assert_eq!(action, "create");
            assert_eq!(request["incidentId"], "i1");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // One request per incident
    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/assistance-requests/create",
            &token,
            json!({ "incidentId": "i1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Dispatch moves it along; the incident itself is untouched
    let key = state.config.dispatch_api_key.clone().unwrap();
    let response = app
        .clone()
        .oneshot(common::dispatch_request(
            "/dispatch/assistance-requests/i1/status",
            &key,
            json!({ "status": "Processing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match dispatch.recv().await.unwrap() {
        ServerEvent::VehicleRequestUpdate { request, action } => {
            assert_eq!(action, "update");
            assert_eq!(request["status"], "Processing");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/assistance-requests/i1/status",
            &token,
        ))
        .await
        .unwrap();
    let request: AssistanceRequest = common::body_json(response).await;
    assert_eq!(
        request.status,
        tanod_patrol::models::AssistanceStatus::Processing
    );
    assert_eq!(
        state.db.get_incident("i1").unwrap().status,
        IncidentStatus::Pending
    );
}

#[tokio::test]
async fn test_tanod_cannot_drive_assistance_status() {
    let (app, state) = common::create_test_app();
    state.db.insert_incident(common::incident("i1"));
    let token = common::create_test_jwt("t1", &state);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/assistance-requests/create",
            &token,
            json!({ "incidentId": "i1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The tanod-facing route no longer accepts status changes
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/assistance-requests/i1/status",
            &token,
            json!({ "status": "Deployed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    // A tanod JWT is not a dispatch credential
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/dispatch/assistance-requests/i1/status",
            &token,
            json!({ "status": "Deployed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(common::dispatch_request(
            "/dispatch/assistance-requests/i1/status",
            "wrong_key",
            json!({ "status": "Deployed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(
        state.db.get_assistance_request("i1").unwrap().status,
        tanod_patrol::models::AssistanceStatus::Pending
    );
}
