//! Integration tests for the demo server router

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use routeprom::{Prometheus, PrometheusConfig, app};
use tower::ServiceExt;

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "demo.local")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn test_demo_router_records_widget_routes() {
    let prometheus =
        Prometheus::new(PrometheusConfig::default().with_ignored(["/health"])).unwrap();
    let app = app::router(&prometheus);

    let response = app
        .clone()
        .oneshot(request("GET", "/widgets/5", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload = r#"{"name":"gear"}"#;
    let mut create = request("POST", "/widgets", Body::from(payload));
    create
        .headers_mut()
        .insert(header::CONTENT_LENGTH, payload.len().into());
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("GET", "/health", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/metrics", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let output = String::from_utf8(body.to_vec()).unwrap();

    assert!(output.contains(
        r#"axum_http_requests_total{host="demo.local",method="GET",route="/widgets/{id}",status="200"} 1"#
    ));
    assert!(output.contains(
        r#"axum_http_requests_total{host="demo.local",method="POST",route="/widgets",status="201"} 1"#
    ));
    assert!(!output.contains("route=\"/health\""));
}
