//! Route-recording wrapper around [`axum::Router`]
//!
//! Axum neither exposes its registered-route list nor names the handler that
//! matched a request. `HostRouter` records every route it registers in a
//! [`RouteCatalog`] and tags each route with the [`HandlerIdentity`] of its
//! handler, which is what the instrumentation middleware resolves.

use super::{HandlerIdentity, RouteCatalog, RouteInfo, RouteSource};
use crate::instance::Prometheus;
use crate::middleware::instrument;
use axum::{
    Extension, Router,
    handler::Handler,
    http::Method,
    middleware,
    routing::{MethodFilter, MethodRouter, on},
};

/// Router builder that keeps a catalog of its routes
///
/// Interceptors installed with [`intercept`](Self::intercept) apply to the
/// routes registered after the call, so register routes that should stay
/// uninstrumented first.
pub struct HostRouter<S = ()> {
    router: Router<S>,
    catalog: RouteCatalog,
    instrumentation: Option<Prometheus>,
}

impl<S> Default for HostRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HostRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            catalog: RouteCatalog::new(),
            instrumentation: None,
        }
    }

    /// Instrument every route registered after this call
    pub fn intercept(mut self, prometheus: &Prometheus) -> Self {
        self.instrumentation = Some(prometheus.clone());
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add_route(Method::GET, MethodFilter::GET, path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add_route(Method::POST, MethodFilter::POST, path, handler)
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add_route(Method::PUT, MethodFilter::PUT, path, handler)
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add_route(Method::PATCH, MethodFilter::PATCH, path, handler)
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add_route(Method::DELETE, MethodFilter::DELETE, path, handler)
    }

    fn add_route<H, T>(self, method: Method, filter: MethodFilter, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let identity = HandlerIdentity::of::<H>();
        self.register(method, path, identity, on(filter, handler))
    }

    /// Register a prepared method router under `identity`
    ///
    /// The identity is suffixed with the route's position in the catalog, so
    /// every registration resolves to its own template.
    pub(crate) fn register(
        mut self,
        method: Method,
        path: &str,
        identity: HandlerIdentity,
        method_router: MethodRouter<S>,
    ) -> Self {
        let identity = identity.with_ordinal(self.catalog.len());
        tracing::debug!(
            method = %method,
            path,
            handler = %identity,
            instrumented = self.instrumentation.is_some(),
            "Registering route"
        );
        self.catalog
            .push(RouteInfo::new(method.as_str(), path, identity.clone()));

        let method_router = match &self.instrumentation {
            Some(prometheus) => method_router.layer(middleware::from_fn_with_state(
                prometheus.clone(),
                instrument,
            )),
            None => method_router,
        };
        // Outermost, so the identity is visible to every interceptor
        let method_router = method_router.layer(Extension(identity));

        self.router = self.router.route(path, method_router);
        self
    }

    /// Shared handle on the registered-route list
    pub fn catalog(&self) -> RouteCatalog {
        self.catalog.clone()
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.catalog.routes()
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}
