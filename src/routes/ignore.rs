//! Route templates excluded from instrumentation

use parking_lot::RwLock;
use std::collections::HashSet;

/// Thread-safe set of route templates that are never instrumented
///
/// Filled at configuration time and read while the [`super::RouteTable`] is
/// built. Additions made after the first build only apply once the table is
/// rebuilt.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    paths: RwLock<HashSet<String>>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut set = self.paths.write();
        set.extend(paths.into_iter().map(Into::into));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.read().contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}

impl<P: Into<String>> FromIterator<P> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let set = Self::new();
        set.add(iter);
        set
    }
}
