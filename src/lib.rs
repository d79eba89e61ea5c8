//! routeprom - Prometheus request metrics for axum, labelled by route template
//!
//! Records request count, duration, request size and response size for every
//! instrumented route. Samples carry the route template a request matched
//! (`/widgets/{id}`), never the concrete path, so label cardinality stays
//! bounded by the number of registered routes.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod instance;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use config::PrometheusConfig;
pub use error::{AppError, AppResult};
pub use instance::Prometheus;
pub use metrics::{HttpMetrics, LabelSet};
pub use routes::{HandlerIdentity, HostRouter, RouteCatalog, RouteInfo, RouteSource};
