//! Route map builder.
//!
//! Flattens the nested configuration tree into three lookup structures: an
//! ordered path list (match priority, wildcards last), a path → record map,
//! and a name → record map. Alias entries expand into synthetic records
//! that remember the path they alias through `match_as`.
//!
//! Building is incremental: calling [`create_route_map`] again with the
//! same [`RouteMapData`] merges additional configuration without touching
//! prior entries, which is what dynamic route registration relies on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{ComponentSource, RouteConfig};
use crate::error::RouterError;
use crate::path::clean_path;
use crate::pattern::CompiledPattern;
use crate::record::{ComponentEntry, RecordId, RouteRecord};

/// The three lookup structures plus the record arena that owns every
/// compiled record.
#[derive(Debug, Default)]
pub(crate) struct RouteMapData {
    pub records: Vec<Arc<RouteRecord>>,
    pub path_list: Vec<String>,
    pub path_map: HashMap<String, RecordId>,
    pub name_map: HashMap<String, RecordId>,
}

impl RouteMapData {
    pub fn record(&self, id: RecordId) -> &Arc<RouteRecord> {
        &self.records[id.0]
    }
}

/// Builds (or incrementally extends) a route map from configuration.
pub(crate) fn create_route_map(
    configs: &[RouteConfig],
    data: &mut RouteMapData,
) -> Result<(), RouterError> {
    for config in configs {
        add_route_record(data, config, None, None)?;
    }

    // Wildcard entries always match last, preserving relative order within
    // each group.
    let mut wildcards = Vec::new();
    data.path_list.retain(|path| {
        if path.starts_with('*') {
            wildcards.push(path.clone());
            false
        } else {
            true
        }
    });
    data.path_list.append(&mut wildcards);

    for path in &data.path_list {
        if !path.is_empty() && !path.starts_with('/') && !path.starts_with('*') {
            tracing::warn!(
                "non-nested route {path:?} is missing a leading slash and will never match"
            );
        }
    }

    Ok(())
}

fn add_route_record(
    data: &mut RouteMapData,
    config: &RouteConfig,
    parent: Option<RecordId>,
    match_as: Option<String>,
) -> Result<(), RouterError> {
    let path = config.path.as_deref().ok_or_else(|| {
        RouterError::Configuration("\"path\" is required in a route configuration".to_string())
    })?;

    let slot_sources = component_sources(config);
    for source in slot_sources.values() {
        if let ComponentSource::Ready(component) = source {
            if component.is_string_id() {
                return Err(RouterError::Configuration(format!(
                    "route component for path {:?} cannot be a string id; \
                     use an actual component value",
                    config.name.as_deref().unwrap_or(path)
                )));
            }
        }
    }

    let mut options = config.pattern_options;
    if let Some(sensitive) = config.case_sensitive {
        options.sensitive = sensitive;
    }

    let parent_path = parent.map(|id| data.record(id).path.clone());
    let normalized = normalize_path(path, parent_path.as_deref(), options.strict);
    let pattern = CompiledPattern::compile(&normalized, options)?;

    let mut seen = HashSet::new();
    for key in pattern.keys() {
        if !seen.insert(key.name.as_str()) {
            tracing::warn!("duplicate param keys in route with path {normalized:?}");
        }
    }

    let components = slot_sources
        .into_iter()
        .map(|(slot, source)| (slot, ComponentEntry::new(source)))
        .collect();

    let id = RecordId(data.records.len());
    data.records.push(Arc::new(RouteRecord {
        path: normalized.clone(),
        pattern,
        components,
        name: config.name.clone(),
        parent,
        match_as: match_as.clone(),
        redirect: config.redirect.clone(),
        before_enter: config.before_enter.clone(),
        before_route_enter: config.before_route_enter.clone(),
        before_route_update: config.before_route_update.clone(),
        before_route_leave: config.before_route_leave.clone(),
        meta: config.meta.clone(),
        props: normalize_props(config),
    }));

    if !config.children.is_empty() {
        // A named route with a default child never renders that child when
        // navigated to by name; the name belongs on the child instead.
        if config.name.is_some()
            && config.redirect.is_none()
            && config
                .children
                .iter()
                .any(|child| matches!(child.path.as_deref(), Some("") | Some("/")))
        {
            tracing::warn!(
                "named route {:?} has a default child route; navigating by name \
                 will not render the default child",
                config.name.as_deref().unwrap_or_default()
            );
        }

        for child in &config.children {
            let child_match_as = match_as.as_ref().map(|alias_path| {
                clean_path(&format!(
                    "{alias_path}/{}",
                    child.path.as_deref().unwrap_or_default()
                ))
            });
            add_route_record(data, child, Some(id), child_match_as)?;
        }
    }

    // First registration wins; a later duplicate path is dropped silently.
    if !data.path_map.contains_key(&normalized) {
        data.path_list.push(normalized.clone());
        data.path_map.insert(normalized.clone(), id);
    }

    for alias in &config.alias {
        if alias == path {
            tracing::warn!(
                "alias {alias:?} has the same value as its path and is ignored"
            );
            continue;
        }
        let alias_config = RouteConfig {
            path: Some(alias.clone()),
            children: config.children.clone(),
            ..RouteConfig::default()
        };
        let alias_match_as = if normalized.is_empty() {
            "/".to_string()
        } else {
            normalized.clone()
        };
        add_route_record(data, &alias_config, parent, Some(alias_match_as))?;
    }

    if let Some(name) = &config.name {
        if !data.name_map.contains_key(name) {
            data.name_map.insert(name.clone(), id);
        } else if match_as.is_none() {
            tracing::warn!(
                "duplicate named route definition {{ name: {name:?}, path: {normalized:?} }}; \
                 keeping the first registration"
            );
        }
    }

    Ok(())
}

/// Named slots win entirely over the single `component` shorthand, which
/// becomes the `default` slot.
fn component_sources(config: &RouteConfig) -> HashMap<String, ComponentSource> {
    if !config.components.is_empty() {
        config.components.clone()
    } else if let Some(component) = &config.component {
        HashMap::from([("default".to_string(), component.clone())])
    } else {
        HashMap::new()
    }
}

fn normalize_props(config: &RouteConfig) -> HashMap<String, serde_json::Value> {
    match &config.props {
        None => HashMap::new(),
        Some(value) if !config.components.is_empty() => value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
        Some(value) => HashMap::from([("default".to_string(), value.clone())]),
    }
}

fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };
    if path.starts_with('/') {
        return path.to_string();
    }
    match parent {
        None => path.to_string(),
        Some(parent) => clean_path(&format!("{parent}/{path}")),
    }
}
