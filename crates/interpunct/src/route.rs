//! Resolved route snapshots.
//!
//! A [`Route`] is a plain, immutable snapshot of a resolved location: the
//! path it matched, its decoded params, and the root-to-leaf chain of
//! records backing it. Snapshots are created per transition and replaced
//! wholesale on commit, never mutated.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::query::{stringify_query, Query};
use crate::record::RouteRecord;

/// A resolved snapshot of a navigation target.
#[derive(Debug, Clone)]
pub struct Route {
    /// Name of the deepest matched record, or the name navigated to.
    pub name: Option<String>,
    /// Matched path, without query or hash.
    pub path: String,
    /// Hash fragment including its leading `#`, or empty.
    pub hash: String,
    /// Decoded query values.
    pub query: Query,
    /// Decoded path parameters.
    pub params: HashMap<String, String>,
    /// `path` + serialized query + hash.
    pub full_path: String,
    /// Record chain from root ancestor to the matched record. Empty for the
    /// not-found sentinel.
    pub matched: Vec<Arc<RouteRecord>>,
    /// Full path of the location this route was redirected from, when
    /// resolution followed a redirect.
    pub redirected_from: Option<String>,
    /// Meta bag of the deepest matched record.
    pub meta: Value,
}

impl Route {
    /// The sentinel route every router starts at, before the first
    /// transition commits.
    pub fn start() -> Self {
        Self {
            name: None,
            path: "/".to_string(),
            hash: String::new(),
            query: Query::new(),
            params: HashMap::new(),
            full_path: "/".to_string(),
            matched: Vec::new(),
            redirected_from: None,
            meta: Value::Null,
        }
    }

    /// Whether this snapshot is still the pre-navigation start sentinel.
    pub fn is_start(&self) -> bool {
        self.matched.is_empty()
            && self.name.is_none()
            && self.path == "/"
            && self.query.is_empty()
            && self.hash.is_empty()
            && self.params.is_empty()
            && self.redirected_from.is_none()
    }
}

/// Reconstructs a `path?query#hash` full path.
pub(crate) fn format_full_path(path: &str, query: &Query, hash: &str) -> String {
    format!("{path}{}{hash}", stringify_query(query))
}

/// Whether two routes address the same location.
///
/// Path-addressed routes compare by path (ignoring a single trailing
/// slash), hash, and query; name-addressed routes additionally compare
/// params.
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    let trim = |p: &str| p.strip_suffix('/').map(str::to_string).unwrap_or_else(|| p.to_string());
    if !a.path.is_empty() && !b.path.is_empty() {
        trim(&a.path) == trim(&b.path) && a.hash == b.hash && a.query == b.query
    } else if let (Some(a_name), Some(b_name)) = (&a.name, &b.name) {
        a_name == b_name && a.hash == b.hash && a.query == b.query && a.params == b.params
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_round_trips_full_path() {
        let start = Route::start();
        assert_eq!(start.full_path, "/");
        assert!(start.is_start());
    }

    #[test]
    fn test_same_route_ignores_trailing_slash() {
        let mut a = Route::start();
        a.path = "/about".to_string();
        let mut b = Route::start();
        b.path = "/about/".to_string();
        assert!(is_same_route(&a, &b));
    }

    #[test]
    fn test_same_route_compares_query() {
        let mut a = Route::start();
        a.path = "/x".to_string();
        let mut b = a.clone();
        assert!(is_same_route(&a, &b));
        b.query.insert("page".to_string(), vec!["2".to_string()]);
        assert!(!is_same_route(&a, &b));
    }

    #[test]
    fn test_format_full_path() {
        let mut query = Query::new();
        query.insert("q".to_string(), vec!["x".to_string()]);
        assert_eq!(format_full_path("/s", &query, "#top"), "/s?q=x#top");
    }
}
