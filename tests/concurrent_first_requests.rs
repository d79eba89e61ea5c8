//! Concurrency tests for lazy route table construction
//!
//! Many requests arrive before the table exists. Exactly one build must win,
//! and every request must still be counted under the right route label.

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
};
use routeprom::{HostRouter, Prometheus, PrometheusConfig};
use tower::ServiceExt;

async fn show_widget(Path(id): Path<u64>) -> String {
    format!("widget {id}")
}

async fn list_widgets() -> &'static str {
    "[]"
}

fn create_test_app() -> (Prometheus, Router) {
    let prometheus = Prometheus::new(PrometheusConfig::default()).unwrap();
    let router = HostRouter::new()
        .intercept(&prometheus)
        .get("/widgets/{id}", show_widget)
        .get("/widgets", list_widgets);
    let app = prometheus.use_router(router).into_router();
    (prometheus, app)
}

fn counter(output: &str, route: &str) -> Option<f64> {
    output
        .lines()
        .filter(|line| line.starts_with("axum_http_requests_total{"))
        .find(|line| line.contains(&format!("route=\"{route}\"")))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_requests_are_all_counted() {
    let (prometheus, app) = create_test_app();
    assert!(!prometheus.route_table().is_built());

    let handles: Vec<_> = (0..200u64)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let uri = if i % 2 == 0 {
                    format!("/widgets/{i}")
                } else {
                    "/widgets".to_string()
                };
                let request = Request::builder()
                    .uri(uri)
                    .header("host", "localhost")
                    .body(Body::empty())
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.expect("task should not panic"), StatusCode::OK);
    }

    assert!(prometheus.route_table().is_built());
    assert_eq!(prometheus.route_table().len(), 3);

    let output = prometheus.metrics().gather().unwrap();
    assert_eq!(counter(&output, "/widgets/{id}"), Some(100.0));
    assert_eq!(counter(&output, "/widgets"), Some(100.0));
}

#[tokio::test]
async fn test_build_after_first_request_is_a_no_op() {
    let (prometheus, app) = create_test_app();

    let request = Request::builder()
        .uri("/widgets")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    assert!(
        !prometheus.build_routes(),
        "table was already built by the first request"
    );
    assert!(prometheus.refresh_routes(), "refresh always rebuilds");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_during_refresh_are_all_counted() {
    let (prometheus, app) = create_test_app();
    prometheus.build_routes();

    let refresher = {
        let prometheus = prometheus.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..500 {
                prometheus.refresh_routes();
            }
        })
    };

    let handles: Vec<_> = (0..100u64)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let request = Request::builder()
                    .uri(format!("/widgets/{i}"))
                    .body(Body::empty())
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.expect("task should not panic"), StatusCode::OK);
    }
    refresher.await.expect("refresher should not panic");

    let output = prometheus.metrics().gather().unwrap();
    assert_eq!(counter(&output, "/widgets/{id}"), Some(100.0));
}
