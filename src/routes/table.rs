//! Handler identity to route template cache

use super::{HandlerIdentity, IgnoreSet, RouteSource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Lazily built `HandlerIdentity -> route template` map
///
/// The table has two phases: [`build`](Self::build) populates it once under
/// the write lock, then [`resolve`](Self::resolve) serves lookups under the
/// read lock. `None` inside the lock means "never built", which is distinct
/// from a built table that happens to be empty.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: RwLock<Option<HashMap<HandlerIdentity, Arc<str>>>>,
}

fn populate(source: &dyn RouteSource, ignored: &IgnoreSet) -> HashMap<HandlerIdentity, Arc<str>> {
    let mut table = HashMap::new();
    let mut skipped = 0usize;
    for route in source.routes() {
        if ignored.contains(&route.path) {
            skipped += 1;
            continue;
        }
        // Last write wins when one handler serves several templates
        if let Some(previous) = table.insert(route.handler.clone(), Arc::from(route.path.as_str())) {
            tracing::debug!(
                handler = %route.handler,
                previous = %previous,
                template = %route.path,
                "Handler registered under several route templates, keeping the last"
            );
        }
    }

    tracing::debug!(
        entries = table.len(),
        ignored = skipped,
        "Route table built"
    );
    table
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the table from `source`, skipping ignored templates
    ///
    /// Idempotent: returns `true` only for the call that performed the build.
    /// Concurrent callers serialize on the write lock and every caller after
    /// the first sees a built table and returns `false`.
    ///
    /// Lock order is table, then ignore set.
    pub fn build(&self, source: &dyn RouteSource, ignored: &IgnoreSet) -> bool {
        let mut entries = self.entries.write();
        if entries.is_some() {
            return false;
        }
        *entries = Some(populate(source, ignored));
        true
    }

    /// Replace the table with a fresh build from `source`
    ///
    /// Clears and repopulates under one write guard, so concurrent lookups see
    /// either the old table or the new one, never an unbuilt gap.
    pub fn rebuild(&self, source: &dyn RouteSource, ignored: &IgnoreSet) {
        let mut entries = self.entries.write();
        *entries = Some(populate(source, ignored));
    }

    /// Look up the route template for a handler
    ///
    /// `None` when the handler was not registered at build time, its template
    /// is ignored, or the table has not been built.
    pub fn resolve(&self, handler: &HandlerIdentity) -> Option<Arc<str>> {
        self.entries
            .read()
            .as_ref()
            .and_then(|entries| entries.get(handler).cloned())
    }

    pub fn is_built(&self) -> bool {
        self.entries.read().is_some()
    }

    /// Drop the table so the next [`build`](Self::build) repopulates it
    pub fn invalidate(&self) {
        *self.entries.write() = None;
    }

    pub fn len(&self) -> usize {
        self.entries.read().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
