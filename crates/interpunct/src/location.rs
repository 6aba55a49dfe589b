//! Raw and normalized navigation targets.
//!
//! A navigation is requested either as a bare path string or as a structured
//! [`Location`] (by path or by route name). [`normalize_location`] resolves
//! a raw target against the current route into a location the matcher can
//! consume directly.

use std::collections::HashMap;

use crate::pattern::fill_params;
use crate::path::{parse_path, resolve_path};
use crate::query::{resolve_query, stringify_query, Query};
use crate::route::Route;

/// A structured navigation target, addressed by path or by route name.
#[derive(Debug, Clone, Default)]
pub struct Location {
    /// Target route name; takes precedence over `path`.
    pub name: Option<String>,
    /// Target path, possibly relative and possibly carrying `?query#hash`.
    pub path: Option<String>,
    /// Path parameters for name-based navigation (or relative-params
    /// navigation when neither name nor path is given).
    pub params: HashMap<String, String>,
    /// Explicit query values; win over any query embedded in `path`.
    pub query: Query,
    /// Hash fragment, with or without the leading `#`.
    pub hash: String,
    /// Resolve a relative path by appending to the current path instead of
    /// replacing its last segment.
    pub append: bool,
    /// Write the resulting location with `replace` instead of `push`.
    pub replace: bool,
}

impl Location {
    /// A location addressed by route name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A location addressed by path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Adds a single path parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a single query value (repeatable for multi-valued keys).
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Sets the hash fragment.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Resolves relative paths by appending to the current path.
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// Marks the navigation as a replace instead of a push.
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// A raw navigation target: a location string or a structured [`Location`].
#[derive(Debug, Clone)]
pub enum RawLocation {
    /// A `path?query#hash` string, possibly relative to the current route.
    Path(String),
    /// A structured location.
    Location(Location),
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Location> for RawLocation {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

/// Whether the location asked for `replace` semantics.
pub(crate) fn wants_replace(raw: &RawLocation) -> bool {
    matches!(raw, RawLocation::Location(location) if location.replace)
}

/// Reconstructs the `path?query#hash` form of a location.
pub(crate) fn location_full_path(location: &Location) -> String {
    let path = location.path.as_deref().unwrap_or("/");
    format!(
        "{path}{}{}",
        stringify_query(&location.query),
        location.hash
    )
}

/// Resolves a raw target against the current route.
///
/// - A name-addressed location passes through untouched; params are merged
///   later against the matched record.
/// - A location with only params navigates relative to the current route:
///   it reuses the current name, or re-fills the deepest matched record's
///   path template with the merged params.
/// - Otherwise the path string is split into path/query/hash and the path
///   part is resolved against the current path (`append` keeps the last
///   segment). Explicit query values win over query text embedded in the
///   path; the hash is `#`-prefixed if it is not already.
pub(crate) fn normalize_location(
    raw: &RawLocation,
    current: Option<&Route>,
    append: bool,
) -> Location {
    let next = match raw {
        RawLocation::Path(path) => Location {
            path: Some(path.clone()),
            ..Location::default()
        },
        RawLocation::Location(location) => location.clone(),
    };

    if next.name.is_some() {
        return next;
    }

    // Relative params navigation: no path, no name, params only.
    if next.path.is_none() && !next.params.is_empty() {
        let Some(current) = current else {
            tracing::warn!("relative params navigation requires a current route");
            return next;
        };
        let mut params = current.params.clone();
        params.extend(next.params.clone());
        if let Some(name) = &current.name {
            return Location {
                name: Some(name.clone()),
                params,
                ..next
            };
        }
        if let Some(record) = current.matched.last() {
            let path = match fill_params(&record.path, &params) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("relative params navigation failed: {err}");
                    String::new()
                }
            };
            return Location {
                path: Some(path),
                params: HashMap::new(),
                ..next
            };
        }
        tracing::warn!("relative params navigation requires a matched current route");
        return next;
    }

    let parsed = parse_path(next.path.as_deref().unwrap_or(""));
    let base_path = current.map(|c| c.path.as_str()).unwrap_or("/");
    let path = if parsed.path.is_empty() {
        base_path.to_string()
    } else {
        resolve_path(&parsed.path, base_path, append || next.append)
    };

    let query = resolve_query(&parsed.query, &next.query);
    let mut hash = if next.hash.is_empty() {
        parsed.hash
    } else {
        next.hash
    };
    if !hash.is_empty() && !hash.starts_with('#') {
        hash = format!("#{hash}");
    }

    Location {
        name: None,
        path: Some(path),
        params: HashMap::new(),
        query,
        hash,
        append: false,
        replace: next.replace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn current(path: &str) -> Route {
        Route {
            path: path.to_string(),
            full_path: path.to_string(),
            ..Route::start()
        }
    }

    #[test]
    fn test_normalize_relative_path() {
        let location =
            normalize_location(&RawLocation::from("child"), Some(&current("/parent/leaf")), false);
        assert_eq!(location.path.as_deref(), Some("/parent/child"));
    }

    #[test]
    fn test_normalize_with_append() {
        let location =
            normalize_location(&RawLocation::from("child"), Some(&current("/parent")), true);
        assert_eq!(location.path.as_deref(), Some("/parent/child"));
    }

    #[test]
    fn test_normalize_splits_query_and_hash() {
        let location = normalize_location(
            &RawLocation::from("/search?q=router#results"),
            None,
            false,
        );
        assert_eq!(location.path.as_deref(), Some("/search"));
        assert_eq!(location.query["q"], vec!["router"]);
        assert_eq!(location.hash, "#results");
    }

    #[test]
    fn test_normalize_explicit_query_wins() {
        let location = normalize_location(
            &RawLocation::Location(
                Location::path("/search?q=stale").with_query("q", "fresh"),
            ),
            None,
            false,
        );
        assert_eq!(location.query["q"], vec!["fresh"]);
    }

    #[test]
    fn test_normalize_named_passthrough() {
        let raw = RawLocation::Location(Location::named("post").with_param("id", "7"));
        let location = normalize_location(&raw, None, false);
        assert_eq!(location.name.as_deref(), Some("post"));
        assert_eq!(location.params["id"], "7");
    }

    #[test]
    fn test_normalize_empty_path_keeps_current() {
        let location = normalize_location(
            &RawLocation::Location(Location::default()),
            Some(&current("/here")),
            false,
        );
        assert_eq!(location.path.as_deref(), Some("/here"));
    }

    #[test]
    fn test_normalize_prefixes_hash() {
        let location = normalize_location(
            &RawLocation::Location(Location::path("/a").with_hash("anchor")),
            None,
            false,
        );
        assert_eq!(location.hash, "#anchor");
    }
}
