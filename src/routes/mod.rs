//! Handler-to-route-template resolution
//!
//! Metrics are labelled with the route template a request matched (for example
//! `/widgets/{id}`) rather than the concrete path, so label cardinality stays
//! bounded by the number of registered routes. The host router identifies the
//! handler serving a request with a [`HandlerIdentity`]; the [`RouteTable`]
//! maps that identity back to the template it was registered under.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub mod host;
pub mod ignore;
pub mod table;

pub use host::HostRouter;
pub use ignore::IgnoreSet;
pub use table::RouteTable;

/// Opaque key naming the handler that serves a request
///
/// Only ever compared, never interpreted. [`HostRouter`] derives it from the
/// handler's type name plus its registration ordinal and inserts it into the
/// request extensions. The ordinal keeps closures apart: every closure in one
/// function shares a type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerIdentity(Arc<str>);

impl HandlerIdentity {
    pub fn new(identity: impl Into<Arc<str>>) -> Self {
        Self(identity.into())
    }

    /// Identity of handler type `H`
    pub fn of<H>() -> Self {
        Self::new(std::any::type_name::<H>())
    }

    /// Suffix the identity with a registration ordinal
    pub fn with_ordinal(self, ordinal: usize) -> Self {
        Self::new(format!("{}#{}", self.0, ordinal))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerIdentity {
    fn from(identity: &str) -> Self {
        Self::new(identity)
    }
}

impl From<String> for HandlerIdentity {
    fn from(identity: String) -> Self {
        Self::new(identity)
    }
}

/// One entry of the host router's registered-route list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub handler: HandlerIdentity,
}

impl RouteInfo {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        handler: impl Into<HandlerIdentity>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler: handler.into(),
        }
    }
}

/// Supplies the full list of registered routes
pub trait RouteSource: Send + Sync {
    fn routes(&self) -> Vec<RouteInfo>;
}

impl RouteSource for Vec<RouteInfo> {
    fn routes(&self) -> Vec<RouteInfo> {
        self.clone()
    }
}

/// Shared, append-only list of routes registered on a [`HostRouter`]
///
/// Clones share the same list, so a catalog handed to
/// [`crate::Prometheus::bind`] also sees routes added afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    routes: Arc<RwLock<Vec<RouteInfo>>>,
}

impl RouteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, route: RouteInfo) {
        self.routes.write().push(route);
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl RouteSource for RouteCatalog {
    fn routes(&self) -> Vec<RouteInfo> {
        self.routes.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn list_widgets() {}

    #[test]
    fn test_identity_of_handler_is_stable() {
        let a = HandlerIdentity::of::<fn()>();
        let b = HandlerIdentity::of::<fn()>();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_of_named_fn_contains_name() {
        fn identity_of_val<H>(_: &H) -> HandlerIdentity {
            HandlerIdentity::of::<H>()
        }
        let id = identity_of_val(&list_widgets);
        assert!(id.as_str().ends_with("list_widgets"), "got {}", id);
    }

    #[test]
    fn test_with_ordinal_separates_same_type() {
        let a = HandlerIdentity::of::<fn()>().with_ordinal(0);
        let b = HandlerIdentity::of::<fn()>().with_ordinal(1);
        assert_ne!(a, b);
        assert!(a.as_str().ends_with("#0"));
    }

    #[test]
    fn test_catalog_clones_share_routes() {
        let catalog = RouteCatalog::new();
        let view = catalog.clone();
        assert!(view.is_empty());

        catalog.push(RouteInfo::new("GET", "/widgets/{id}", "show"));
        assert_eq!(view.len(), 1);
        assert_eq!(view.routes()[0].path, "/widgets/{id}");
        assert_eq!(view.routes()[0].handler.as_str(), "show");
    }
}
