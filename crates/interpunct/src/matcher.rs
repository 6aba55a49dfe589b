//! Location matching, redirect-following, and alias re-resolution.
//!
//! The matcher resolves a raw location against the route map: name lookups
//! go through the name map (reusing current-route params for the dynamic
//! segments the target declares), path lookups scan the ordered path list,
//! redirects recurse with `redirected_from` carried forward, and alias
//! records re-resolve against the path they alias so the real record chain
//! backs the route while the externally visible path stays the alias.
//!
//! Matching never fails for an unknown target; it degrades to a not-found
//! sentinel route so the host can render a fallback view. Only a location
//! with neither path nor name is a configuration error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::config::{RedirectTarget, RouteConfig};
use crate::error::RouterError;
use crate::location::{location_full_path, normalize_location, Location, RawLocation};
use crate::map::{create_route_map, RouteMapData};
use crate::path::resolve_path;
use crate::pattern::fill_params;
use crate::record::{RecordId, RouteRecord};
use crate::route::{format_full_path, Route};

/// Resolves raw locations to [`Route`] snapshots against a route map.
///
/// Shared behind an `Arc`; `add_routes` merges additional configuration
/// into the existing map.
pub struct Matcher {
    data: RwLock<RouteMapData>,
}

impl Matcher {
    /// Builds a matcher from the given route configuration.
    pub fn new(routes: &[RouteConfig]) -> Result<Self, RouterError> {
        let mut data = RouteMapData::default();
        create_route_map(routes, &mut data)?;
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Merges additional routes into the existing map. Previously
    /// registered records are untouched; first registration still wins on
    /// duplicates.
    pub fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), RouterError> {
        let mut data = self.data.write().expect("route map lock poisoned");
        create_route_map(routes, &mut data)
    }

    /// Resolves a raw location against the current route.
    pub fn match_location(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
    ) -> Result<Route, RouterError> {
        let data = self.data.read().expect("route map lock poisoned");
        match_inner(&data, raw, current, None)
    }

    /// Snapshot of the ordered path list (match priority order).
    pub fn paths(&self) -> Vec<String> {
        self.data
            .read()
            .expect("route map lock poisoned")
            .path_list
            .clone()
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher").finish_non_exhaustive()
    }
}

fn match_inner(
    data: &RouteMapData,
    raw: &RawLocation,
    current: Option<&Route>,
    redirected_from: Option<&Location>,
) -> Result<Route, RouterError> {
    let mut location = normalize_location(raw, current, false);

    if let Some(name) = location.name.clone() {
        let Some(&id) = data.name_map.get(&name) else {
            tracing::warn!("route with name {name:?} does not exist");
            return Ok(build_route(&location, HashMap::new(), Vec::new(), redirected_from));
        };
        let record = Arc::clone(data.record(id));

        // Name-based navigation reuses the current route's params for the
        // dynamic segments the target also declares.
        if let Some(current) = current {
            let declared: Vec<&str> = record
                .pattern
                .keys()
                .iter()
                .filter(|key| !key.optional)
                .map(|key| key.name.as_str())
                .collect();
            for (key, value) in &current.params {
                if !location.params.contains_key(key) && declared.contains(&key.as_str()) {
                    location.params.insert(key.clone(), value.clone());
                }
            }
        }

        let path = match fill_params(&record.path, &location.params) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!("cannot resolve named route {name:?}: {err}");
                return Ok(build_route(&location, HashMap::new(), Vec::new(), redirected_from));
            }
        };
        location.path = Some(path.clone());

        let Some(captured) = record.pattern.captures(&path) else {
            tracing::warn!(
                "synthesized path {path:?} does not match the pattern of named route {name:?}"
            );
            return Ok(build_route(&location, HashMap::new(), Vec::new(), redirected_from));
        };
        let mut params = location.params.clone();
        params.extend(captured);
        return create_matched_route(data, Some(id), &location, params, redirected_from);
    }

    if let Some(path) = location.path.clone() {
        for candidate in &data.path_list {
            let id = data.path_map[candidate];
            let record = data.record(id);
            if let Some(params) = record.pattern.captures(&path) {
                return create_matched_route(data, Some(id), &location, params, redirected_from);
            }
        }
        return Ok(build_route(&location, HashMap::new(), Vec::new(), redirected_from));
    }

    Err(RouterError::Configuration(
        "a navigation location requires either a path or a name".to_string(),
    ))
}

/// Dispatches a matched record through redirect and alias handling before
/// building the final snapshot.
fn create_matched_route(
    data: &RouteMapData,
    id: Option<RecordId>,
    location: &Location,
    params: HashMap<String, String>,
    redirected_from: Option<&Location>,
) -> Result<Route, RouterError> {
    if let Some(id) = id {
        let record = Arc::clone(data.record(id));
        if let Some(redirect) = record.redirect.clone() {
            // Through a redirect chain, the original location is the one
            // navigation started from.
            let original = redirected_from.cloned().unwrap_or_else(|| {
                let mut loc = location.clone();
                loc.params = params.clone();
                loc
            });
            return follow_redirect(data, &record, id, &redirect, &original);
        }
        if let Some(match_as) = record.match_as.clone() {
            return resolve_alias(data, &record, &match_as, location, params, redirected_from);
        }
        let chain = ancestor_chain(data, id);
        return Ok(build_route(location, params, chain, redirected_from));
    }
    Ok(build_route(location, params, Vec::new(), redirected_from))
}

fn follow_redirect(
    data: &RouteMapData,
    record: &Arc<RouteRecord>,
    id: RecordId,
    redirect: &RedirectTarget,
    original: &Location,
) -> Result<Route, RouterError> {
    let target_raw = match redirect {
        RedirectTarget::Location(raw) => raw.clone(),
        RedirectTarget::Resolver(resolve) => {
            // The resolver sees the route that matched the redirecting
            // record.
            let chain = ancestor_chain(data, id);
            let matched = build_route(original, original.params.clone(), chain, None);
            resolve(&matched)
        }
    };

    let target = match target_raw {
        RawLocation::Path(path) => Location {
            path: Some(path),
            ..Location::default()
        },
        RawLocation::Location(location) => location,
    };

    // The redirect target inherits query, hash, and params from the
    // incoming location unless it specifies its own.
    let query = if target.query.is_empty() {
        original.query.clone()
    } else {
        target.query
    };
    let hash = if target.hash.is_empty() {
        original.hash.clone()
    } else {
        target.hash
    };
    let params = if target.params.is_empty() {
        original.params.clone()
    } else {
        target.params
    };

    if let Some(name) = target.name {
        if !data.name_map.contains_key(&name) {
            tracing::warn!("redirect of {:?} targets unknown route name {name:?}", record.path);
        }
        let raw = RawLocation::Location(Location {
            name: Some(name),
            params,
            query,
            hash,
            ..Location::default()
        });
        return match_inner(data, &raw, None, Some(original));
    }

    if let Some(path) = target.path {
        // A relative redirect path resolves against the redirecting
        // record's parent.
        let base = record
            .parent
            .map(|parent| data.record(parent).path.clone())
            .unwrap_or_else(|| "/".to_string());
        let raw_path = resolve_path(&path, &base, true);
        let filled = match fill_params(&raw_path, &params) {
            Ok(filled) => filled,
            Err(err) => {
                tracing::warn!("cannot fill redirect target {raw_path:?}: {err}");
                return Ok(build_route(original, HashMap::new(), Vec::new(), None));
            }
        };
        let raw = RawLocation::Location(Location {
            path: Some(filled),
            query,
            hash,
            ..Location::default()
        });
        return match_inner(data, &raw, None, Some(original));
    }

    tracing::warn!("invalid redirect in route {:?}: neither path nor name", record.path);
    Ok(build_route(original, HashMap::new(), Vec::new(), None))
}

fn resolve_alias(
    data: &RouteMapData,
    record: &Arc<RouteRecord>,
    match_as: &str,
    location: &Location,
    params: HashMap<String, String>,
    redirected_from: Option<&Location>,
) -> Result<Route, RouterError> {
    let aliased_path = match fill_params(match_as, &params) {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!("cannot re-resolve alias {:?}: {err}", record.path);
            return Ok(build_route(location, params, Vec::new(), redirected_from));
        }
    };

    let aliased = match_inner(data, &RawLocation::Path(aliased_path), None, None)?;
    if !aliased.matched.is_empty() {
        // Render the aliased record chain; keep the alias path visible.
        return Ok(build_route(
            location,
            aliased.params.clone(),
            aliased.matched,
            redirected_from,
        ));
    }

    Ok(build_route(location, params, Vec::new(), redirected_from))
}

fn ancestor_chain(data: &RouteMapData, id: RecordId) -> Vec<Arc<RouteRecord>> {
    let mut chain = Vec::new();
    let mut next = Some(id);
    while let Some(id) = next {
        let record = data.record(id);
        chain.push(Arc::clone(record));
        next = record.parent;
    }
    chain.reverse();
    chain
}

fn build_route(
    location: &Location,
    params: HashMap<String, String>,
    matched: Vec<Arc<RouteRecord>>,
    redirected_from: Option<&Location>,
) -> Route {
    let record = matched.last();
    let path = location
        .path
        .clone()
        .unwrap_or_else(|| "/".to_string());
    let query = location.query.clone();
    let hash = location.hash.clone();
    Route {
        name: location
            .name
            .clone()
            .or_else(|| record.and_then(|r| r.name.clone())),
        meta: record.map(|r| r.meta.clone()).unwrap_or(Value::Null),
        full_path: format_full_path(&path, &query, &hash),
        path,
        query,
        hash,
        params,
        matched,
        redirected_from: redirected_from.map(location_full_path),
    }
}
