//! Route configuration input.
//!
//! A router is built from an ordered sequence of [`RouteConfig`] values,
//! possibly nested through `children`. Components are opaque handles to
//! whatever the host framework renders; this core never looks inside one,
//! except to reject the classic mistake of registering a bare string
//! identifier instead of an actual component value.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::guard::Guard;
use crate::location::RawLocation;
use crate::pattern::PatternOptions;
use crate::route::Route;

/// An opaque component handle.
///
/// Identity is pointer identity: two clones of the same handle compare
/// equal under [`Component::ptr_eq`], which is what the transition engine
/// uses when diffing matched chains.
#[derive(Clone)]
pub struct Component(Arc<dyn Any + Send + Sync>);

impl Component {
    /// Wraps any value as a component handle.
    pub fn new<T: Any + Send + Sync>(component: T) -> Self {
        Self(Arc::new(component))
    }

    /// Borrows the wrapped value back, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether two handles wrap the same underlying value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A string is a component *identifier*, not a component; registering
    /// one is a configuration error.
    pub(crate) fn is_string_id(&self) -> bool {
        self.0.is::<String>() || self.0.is::<&'static str>()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Component(..)")
    }
}

/// A loader for a component resolved on demand during a transition.
pub type LazyComponent =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Component>> + Send + Sync>;

/// A component that is either available now or resolved asynchronously the
/// first time one of its routes is activated.
#[derive(Clone)]
pub enum ComponentSource {
    /// An already-available component.
    Ready(Component),
    /// A loader invoked during the transition's resolution stage; the
    /// result is cached on the record.
    Lazy(LazyComponent),
}

impl ComponentSource {
    /// Wraps an async loader.
    pub fn lazy<F>(load: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<Component>> + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(load))
    }
}

impl From<Component> for ComponentSource {
    fn from(component: Component) -> Self {
        Self::Ready(component)
    }
}

impl fmt::Debug for ComponentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("ComponentSource::Ready(..)"),
            Self::Lazy(_) => f.write_str("ComponentSource::Lazy(..)"),
        }
    }
}

/// Where a redirecting record sends the navigation.
#[derive(Clone)]
pub enum RedirectTarget {
    /// A fixed location.
    Location(RawLocation),
    /// A function of the route that matched the redirecting record.
    Resolver(Arc<dyn Fn(&Route) -> RawLocation + Send + Sync>),
}

impl RedirectTarget {
    /// Redirect to a fixed location.
    pub fn to(location: impl Into<RawLocation>) -> Self {
        Self::Location(location.into())
    }

    /// Redirect through a resolver function.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&Route) -> RawLocation + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(raw) => f.debug_tuple("RedirectTarget::Location").field(raw).finish(),
            Self::Resolver(_) => f.write_str("RedirectTarget::Resolver(..)"),
        }
    }
}

/// One node of the route configuration tree.
///
/// # Examples
///
/// ```
/// use interpunct::config::{Component, RouteConfig};
///
/// let routes = vec![
///     RouteConfig::new("/").with_name("home").with_component(Component::new("Home".len())),
///     RouteConfig::new("/user/:id")
///         .with_name("user")
///         .with_component(Component::new(42u32))
///         .with_child(RouteConfig::new("posts").with_component(Component::new(7u32))),
/// ];
/// # let _ = routes;
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
    /// Path template, absolute or relative to the parent. Required.
    pub path: Option<String>,
    /// Component for the default view slot.
    pub component: Option<ComponentSource>,
    /// Components per named view slot; takes precedence over `component`
    /// when non-empty.
    pub components: HashMap<String, ComponentSource>,
    /// Unique route name for name-based navigation.
    pub name: Option<String>,
    /// Redirect issued whenever this record matches.
    pub redirect: Option<RedirectTarget>,
    /// Props passed through to the host, per view slot (or as a single
    /// value for the default slot).
    pub props: Option<Value>,
    /// Additional paths that resolve to this record's component chain.
    pub alias: Vec<String>,
    /// Nested child routes.
    pub children: Vec<RouteConfig>,
    /// Route-level guard, run when the record is newly activated.
    pub before_enter: Option<Guard>,
    /// Component enter hook, run after async component resolution.
    pub before_route_enter: Option<Guard>,
    /// Component update hook, run when the record stays active across the
    /// transition.
    pub before_route_update: Option<Guard>,
    /// Component leave hook, run when the record is deactivated.
    pub before_route_leave: Option<Guard>,
    /// Opaque meta bag, surfaced on the resolved route.
    pub meta: Value,
    /// Overrides `PatternOptions::sensitive` for this record.
    pub case_sensitive: Option<bool>,
    /// Pattern compilation options.
    pub pattern_options: PatternOptions,
}

impl RouteConfig {
    /// A configuration for the given path template.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the default-slot component.
    pub fn with_component(mut self, component: impl Into<ComponentSource>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Adds a component for a named view slot.
    pub fn with_named_component(
        mut self,
        slot: impl Into<String>,
        component: impl Into<ComponentSource>,
    ) -> Self {
        self.components.insert(slot.into(), component.into());
        self
    }

    /// Sets the route name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the redirect target.
    pub fn with_redirect(mut self, redirect: RedirectTarget) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Adds a single alias path.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    /// Adds several alias paths at once.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Adds a nested child route.
    pub fn with_child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Replaces the child routes.
    pub fn with_children(mut self, children: Vec<RouteConfig>) -> Self {
        self.children = children;
        self
    }

    /// Sets the route-level enter guard.
    pub fn with_before_enter(mut self, guard: Guard) -> Self {
        self.before_enter = Some(guard);
        self
    }

    /// Sets the component enter hook.
    pub fn with_enter_hook(mut self, guard: Guard) -> Self {
        self.before_route_enter = Some(guard);
        self
    }

    /// Sets the component update hook.
    pub fn with_update_hook(mut self, guard: Guard) -> Self {
        self.before_route_update = Some(guard);
        self
    }

    /// Sets the component leave hook.
    pub fn with_leave_hook(mut self, guard: Guard) -> Self {
        self.before_route_leave = Some(guard);
        self
    }

    /// Sets the meta bag.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the props pass-through.
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }

    /// Overrides case sensitivity for this record's pattern.
    pub fn with_case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    /// Sets the pattern compilation options.
    pub fn with_pattern_options(mut self, options: PatternOptions) -> Self {
        self.pattern_options = options;
        self
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
