//! Per-request instrumentation middleware
//!
//! Resolves the matched handler to its route template, times the downstream
//! handler and records count, duration, request size and response size under
//! one label set. Requests whose handler is unknown or whose template is
//! ignored pass through untouched and record nothing.

use crate::instance::Prometheus;
use crate::metrics::LabelSet;
use crate::routes::HandlerIdentity;
use axum::{
    body::HttpBody,
    extract::{Request, State},
    http::{HeaderMap, Version, header},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Middleware that records request metrics for resolvable routes
///
/// Install it through [`crate::HostRouter::intercept`], which also attaches
/// the [`HandlerIdentity`] this middleware resolves.
pub async fn instrument(
    State(prometheus): State<Prometheus>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    prometheus.ensure_routes();

    let route = request
        .extensions()
        .get::<HandlerIdentity>()
        .and_then(|handler| prometheus.resolve(handler));
    let Some(route) = route else {
        tracing::trace!(
            method = %request.method(),
            uri = %request.uri(),
            "No route template for request, skipping instrumentation"
        );
        return next.run(request).await;
    };

    let request_size = approximate_request_size(&request);
    let method = request.method().clone();
    let host = request_host(&request);

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let response_size = response_size(&response);
    let labels = LabelSet::new(response.status(), &method, &host, route);

    if let Err(e) =
        prometheus
            .metrics()
            .record_request(&labels, elapsed_ms, request_size, response_size)
    {
        tracing::warn!(
            error = %e,
            route = labels.route(),
            status = labels.status(),
            "Failed to record request metrics"
        );
    }

    response
}

/// Approximate wire size of a request
///
/// Sums the path and query, method and protocol lengths, every header name
/// and value, the URI authority when no `Host` header is present (HTTP/2),
/// and the declared `Content-Length`. Chunked bodies and trailers are not counted and
/// a missing or malformed `Content-Length` counts as 0.
pub fn approximate_request_size<B>(request: &axum::http::Request<B>) -> u64 {
    let target = request
        .uri()
        .path_and_query()
        .map_or(request.uri().path(), |target| target.as_str());
    let mut size = target.len()
        + request.method().as_str().len()
        + protocol(request.version()).len();

    for (name, value) in request.headers() {
        size += name.as_str().len() + value.len();
    }

    if !request.headers().contains_key(header::HOST) {
        size += request.uri().host().map_or(0, str::len);
    }

    size as u64 + content_length(request.headers()).unwrap_or(0)
}

fn protocol(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == Version::HTTP_2 {
        "HTTP/2.0"
    } else if version == Version::HTTP_3 {
        "HTTP/3.0"
    } else {
        "HTTP/1.1"
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// `Host` header, falling back to the URI authority
fn request_host(request: &Request) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_string()
}

/// Body length known once the handler has returned
///
/// Exact for buffered bodies. Streaming bodies fall back to a declared
/// `Content-Length`, else 0.
fn response_size(response: &Response) -> u64 {
    response
        .body()
        .size_hint()
        .exact()
        .or_else(|| content_length(response.headers()))
        .unwrap_or(0)
}
