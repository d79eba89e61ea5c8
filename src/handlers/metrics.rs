//! Prometheus metrics endpoint
//!
//! Exposes the registry in Prometheus text format for scraping, optionally
//! behind a shared bearer token.

use crate::error::AppError;
use crate::instance::Prometheus;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::TEXT_FORMAT;

/// Body returned when the bearer check fails
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or missing token";

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `401 Unauthorized` with `Invalid or missing token` when a token is
///   configured and the `Authorization` header is not exactly `Bearer <token>`
/// - `500 Internal Server Error` if metrics encoding fails
///
/// The comparison is a plain string match, not constant-time.
///
/// # Example
///
/// ```bash
/// curl -H 'Authorization: Bearer secret' http://localhost:3000/metrics
/// # HELP axum_http_requests_total How many HTTP requests processed, ...
/// # TYPE axum_http_requests_total counter
/// axum_http_requests_total{host="localhost:3000",method="GET",route="/widgets/{id}",status="200"} 42
/// ```
pub async fn handler(State(prometheus): State<Prometheus>, headers: HeaderMap) -> Response {
    if let Some(token) = prometheus.config().token() {
        if !is_authorized(&headers, token) {
            tracing::debug!("Rejected metrics scrape with invalid or missing token");
            return (StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE).into_response();
        }
    }

    match prometheus.metrics().gather() {
        Ok(output) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(TEXT_FORMAT),
            )],
            output,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to gather metrics for Prometheus scraping"
            );
            AppError::Internal(format!("Failed to gather metrics: {}", e)).into_response()
        }
    }
}

fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == token)
}
