// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dispatch service authentication middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the dispatch service's shared secret.
pub const DISPATCH_KEY_HEADER: &str = "x-dispatch-key";

/// Require the dispatch shared secret for `/dispatch/*` routes.
///
/// Tanod JWTs are not accepted here.
pub async fn require_dispatch_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.dispatch_api_key.as_deref() else {
        tracing::warn!("Blocked dispatch request: DISPATCH_API_KEY is not configured");
        return Err(StatusCode::FORBIDDEN);
    };

    let provided = request
        .headers()
        .get(DISPATCH_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!(path = %request.uri().path(), "Blocked dispatch request with invalid key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
