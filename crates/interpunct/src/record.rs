//! Compiled route records.
//!
//! A [`RouteRecord`] is the immutable, compiled form of one configuration
//! node. Records live in an arena owned by the route map; parent links are
//! arena indices, which keeps the tree free of ownership cycles while the
//! matcher can still walk ancestor chains.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::config::{Component, ComponentSource, RedirectTarget};
use crate::guard::Guard;
use crate::pattern::CompiledPattern;

/// Stable identifier of a record inside its map's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub(crate) usize);

/// A view-slot component plus its resolution cache.
pub struct ComponentEntry {
    source: ComponentSource,
    resolved: OnceCell<Component>,
}

impl ComponentEntry {
    pub(crate) fn new(source: ComponentSource) -> Self {
        Self {
            source,
            resolved: OnceCell::new(),
        }
    }

    /// The component, if ready or already resolved.
    pub fn get(&self) -> Option<Component> {
        match &self.source {
            ComponentSource::Ready(component) => Some(component.clone()),
            ComponentSource::Lazy(_) => self.resolved.get().cloned(),
        }
    }

    /// Resolves the component, invoking the loader at most once per record.
    pub(crate) async fn resolve(&self) -> anyhow::Result<Component> {
        match &self.source {
            ComponentSource::Ready(component) => Ok(component.clone()),
            ComponentSource::Lazy(load) => {
                if let Some(component) = self.resolved.get() {
                    return Ok(component.clone());
                }
                let component = load().await?;
                // A concurrent resolution may have won the race; either
                // value is the loader's output.
                let _ = self.resolved.set(component.clone());
                Ok(component)
            }
        }
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("source", &self.source)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

/// A compiled, immutable route configuration node.
pub struct RouteRecord {
    /// Normalized absolute path template (empty string for the root).
    pub path: String,
    /// Compiled matcher for `path`.
    pub pattern: CompiledPattern,
    /// View-slot name → component.
    pub components: HashMap<String, ComponentEntry>,
    /// Unique route name, if any.
    pub name: Option<String>,
    /// Arena index of the enclosing record.
    pub(crate) parent: Option<RecordId>,
    /// Path of the record this one aliases, when generated by alias
    /// expansion.
    pub match_as: Option<String>,
    /// Redirect issued whenever this record matches.
    pub redirect: Option<RedirectTarget>,
    /// Route-level enter guard.
    pub(crate) before_enter: Option<Guard>,
    /// Component lifecycle hooks carried on the record.
    pub(crate) before_route_enter: Option<Guard>,
    pub(crate) before_route_update: Option<Guard>,
    pub(crate) before_route_leave: Option<Guard>,
    /// Opaque meta bag.
    pub meta: Value,
    /// Props pass-through, per view slot.
    pub props: HashMap<String, Value>,
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("match_as", &self.match_as)
            .field("redirect", &self.redirect.is_some())
            .finish_non_exhaustive()
    }
}
