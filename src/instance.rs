//! The instrumenting instance
//!
//! [`Prometheus`] ties configuration, the route table and the request metrics
//! together. It is cheap to clone; clones share all state.
//!
//! # Example
//!
//! ```no_run
//! use routeprom::{HostRouter, Prometheus, PrometheusConfig};
//!
//! # fn main() -> Result<(), routeprom::AppError> {
//! let prometheus = Prometheus::new(PrometheusConfig::default().with_ignored(["/health"]))?;
//!
//! let router = HostRouter::<()>::new()
//!     .intercept(&prometheus)
//!     .get("/health", || async { "ok" })
//!     .get("/widgets/{id}", || async { "widget" });
//!
//! // Mounts GET /metrics and binds the route list
//! let app: axum::Router = prometheus.use_router(router).into_router();
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

use crate::config::PrometheusConfig;
use crate::error::{AppError, AppResult};
use crate::handlers;
use crate::metrics::HttpMetrics;
use crate::routes::{HandlerIdentity, HostRouter, IgnoreSet, RouteSource, RouteTable};
use axum::http::Method;
use axum::routing::get;
use parking_lot::RwLock;
use prometheus::Registry;
use std::sync::Arc;

/// Configured instrumentation: metrics, route table and scrape settings
#[derive(Clone)]
pub struct Prometheus {
    inner: Arc<Inner>,
}

struct Inner {
    config: PrometheusConfig,
    metrics: HttpMetrics,
    routes: RouteTable,
    ignored: IgnoreSet,
    source: RwLock<Option<Arc<dyn RouteSource>>>,
}

impl Prometheus {
    /// Create an instance with its own registry
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for invalid settings.
    pub fn new(config: PrometheusConfig) -> AppResult<Self> {
        Self::with_registry(config, Registry::new())
    }

    /// Create an instance whose collectors live on `registry`
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for invalid settings and
    /// `AppError::MetricRegistration` when `registry` already holds collectors
    /// for the same namespace and subsystem.
    pub fn with_registry(config: PrometheusConfig, registry: Registry) -> AppResult<Self> {
        config.validate()?;

        let metrics = HttpMetrics::register(&registry, config.namespace(), config.subsystem())
            .map_err(|source| AppError::MetricRegistration {
                namespace: config.namespace().to_string(),
                subsystem: config.subsystem().to_string(),
                source,
            })?;

        let ignored: IgnoreSet = config.ignored().iter().cloned().collect();

        tracing::info!(
            path = config.path(),
            namespace = config.namespace(),
            subsystem = config.subsystem(),
            token_required = config.token().is_some(),
            ignored = ignored.len(),
            "Prometheus instrumentation configured"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                metrics,
                routes: RouteTable::new(),
                ignored,
                source: RwLock::new(None),
            }),
        })
    }

    pub fn config(&self) -> &PrometheusConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.inner.metrics
    }

    pub fn registry(&self) -> &Registry {
        self.inner.metrics.registry()
    }

    /// Attach the route source the route table is built from
    ///
    /// Replaces any previous source. An already built table keeps its
    /// entries until [`refresh_routes`](Self::refresh_routes).
    pub fn bind(&self, source: impl RouteSource + 'static) {
        *self.inner.source.write() = Some(Arc::new(source));
    }

    /// Mount the scrape endpoint on `router` and bind its route list
    ///
    /// The endpoint is registered like any other route, so it is instrumented
    /// when the router already intercepts with this instance.
    pub fn use_router<S>(&self, router: HostRouter<S>) -> HostRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let scrape = get(handlers::metrics::handler).with_state(self.clone());
        let router = router.register(
            Method::GET,
            self.config().path(),
            HandlerIdentity::of::<ScrapeHandler>(),
            scrape,
        );
        self.bind(router.catalog());
        router
    }

    /// Exclude more route templates
    ///
    /// Applies to the next build; call before the first request or follow
    /// with [`refresh_routes`](Self::refresh_routes).
    pub fn ignore<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.inner.ignored.add(paths);
    }

    /// Build the route table from the bound source
    ///
    /// Returns `true` if this call populated the table. Without a bound
    /// source the table stays unbuilt so a later binding still takes effect.
    pub fn build_routes(&self) -> bool {
        let source = self.inner.source.read().clone();
        match source {
            Some(source) => self.inner.routes.build(source.as_ref(), &self.inner.ignored),
            None => {
                tracing::debug!("No route source bound, skipping route table build");
                false
            }
        }
    }

    /// Build the table on first use
    pub(crate) fn ensure_routes(&self) {
        if !self.inner.routes.is_built() {
            self.build_routes();
        }
    }

    /// Rebuild the route table from the bound source
    ///
    /// Requests in flight keep resolving against the old table until the new
    /// one is in place. Without a bound source the table is dropped and
    /// `false` is returned.
    pub fn refresh_routes(&self) -> bool {
        let source = self.inner.source.read().clone();
        match source {
            Some(source) => {
                self.inner.routes.rebuild(source.as_ref(), &self.inner.ignored);
                true
            }
            None => {
                self.inner.routes.invalidate();
                false
            }
        }
    }

    /// Route template for `handler`, `None` when unknown or ignored
    pub fn resolve(&self, handler: &HandlerIdentity) -> Option<Arc<str>> {
        self.inner.routes.resolve(handler)
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.inner.routes
    }
}

/// Identity marker for the scrape endpoint
struct ScrapeHandler;
