// ABOUTME: HTTP route handlers for token issuance and gate admission
// ABOUTME: Thin axum wrappers that delegate to the admission service and map typed errors to statuses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Gate-facing HTTP routes
//!
//! Handlers are thin wrappers over [`AdmissionService`]; all protocol and
//! business decisions live in the service layer.

use crate::admission::AdmissionService;
use crate::constants::routes;
use crate::errors::{AdmissionError, ErrorResponse};
use crate::models::{Direction, PresenceState};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Token issuance request from a holder's device
#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    /// Ticket to issue for
    pub ticket_id: Uuid,
    /// Hash identifying the requesting device
    pub device_hash: String,
    /// Requested lifetime, clamped server-side
    pub ttl_seconds: u64,
}

/// Token issuance response
#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    /// Signed token, ready for QR display
    pub token: String,
    /// Lifetime actually granted, seconds
    pub ttl_seconds: u64,
}

/// Admission request from a gate scanner
#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    /// Decoded token string
    pub token: String,
    /// Direction toggle the operator selected
    pub direction: Direction,
    /// Identifier of the scanning gate
    pub gate_id: String,
}

/// Admission response shown on the gate UI
#[derive(Debug, Serialize)]
pub struct AdmitResponse {
    /// Admitted ticket
    pub ticket_id: Uuid,
    /// Event the ticket belongs to
    pub event_id: Uuid,
    /// Seat label, if any
    pub seat_id: Option<String>,
    /// Presence state after the scan
    pub current_state: PresenceState,
    /// Always false on the success path
    pub revoked: bool,
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Build the gate API router
#[must_use]
pub fn router(service: Arc<AdmissionService>) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health_handler))
        .route(routes::TOKENS, post(issue_token_handler))
        .route(routes::ADMISSIONS, post(admit_handler))
        .with_state(service)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn issue_token_handler(
    State(service): State<Arc<AdmissionService>>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, AdmissionError> {
    let issued = service
        .issue_token(request.ticket_id, &request.device_hash, request.ttl_seconds)
        .await?;
    Ok(Json(IssueTokenResponse {
        token: issued.token,
        ttl_seconds: issued.ttl_seconds,
    }))
}

async fn admit_handler(
    State(service): State<Arc<AdmissionService>>,
    Json(request): Json<AdmitRequest>,
) -> Result<Json<AdmitResponse>, AdmissionError> {
    let decision = service
        .admit(&request.token, request.direction, &request.gate_id)
        .await?;
    Ok(Json(AdmitResponse {
        ticket_id: decision.ticket_id,
        event_id: decision.event_id,
        seat_id: decision.seat_id,
        current_state: decision.current_state,
        revoked: decision.revoked,
    }))
}
