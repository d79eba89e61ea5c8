//! Demo application wiring
//!
//! `intercept` comes first so every route below it is instrumented;
//! `use_router` then mounts the scrape endpoint and binds the route list.
//! Health probes are kept out of the metrics through the `ignored` setting.

use crate::handlers;
use crate::instance::Prometheus;
use crate::routes::HostRouter;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the demo router instrumented by `prometheus`
pub fn router(prometheus: &Prometheus) -> Router {
    let router = HostRouter::new()
        .intercept(prometheus)
        .get("/health", handlers::health::handler)
        .get("/widgets/{id}", handlers::widgets::show)
        .post("/widgets", handlers::widgets::create);

    prometheus
        .use_router(router)
        .into_router()
        .layer(TraceLayer::new_for_http())
}
