//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK. The demo config ignores `/health`, so probes do not
/// show up in request metrics.
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "OK" }))
}
