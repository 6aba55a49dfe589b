//! The public navigation API.
//!
//! A [`Router`] ties the matcher and the transition engine together behind
//! the conventional surface: `push`/`replace` (callback or deferred form),
//! `go`/`back`/`forward`, `resolve`, dynamic `add_routes`, and guard
//! registration with unregister handles.

use std::sync::{Arc, Mutex};

use futures::channel::oneshot;

use crate::config::{Component, RouteConfig};
use crate::error::{NavigationFailure, RouterError};
use crate::guard::{AfterHook, Guard, Listener};
use crate::history::{
    AbortCallback, CompleteCallback, ErrorHook, HashHistory, HistoryStrategy, LocationBackend,
    MemoryHistory, ReadyCallback, ReadyErrorCallback, TransitionEngine, UrlHistory, UrlWrite,
};
use crate::location::{normalize_location, Location, RawLocation};
use crate::matcher::Matcher;
use crate::path::clean_path;
use crate::route::Route;

/// Which history strategy the router navigates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterMode {
    /// Locations in the URL path; requires a backend with push-state
    /// support.
    UrlPath,
    /// Locations in the hash fragment.
    Fragment,
    /// Locations in an in-process stack.
    InMemory,
}

/// Router construction options.
pub struct RouterOptions {
    /// The route configuration tree.
    pub routes: Vec<RouteConfig>,
    /// Requested strategy; subject to capability detection (see
    /// [`Router::new`]).
    pub mode: RouterMode,
    /// App base path, stripped from and prepended to every location.
    pub base: String,
    /// Host location primitives. Without one the router always runs
    /// in-memory.
    pub backend: Option<Arc<dyn LocationBackend>>,
    /// Fall back to the fragment strategy when `UrlPath` is requested but
    /// the backend lacks push-state support. On by default.
    pub fallback: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            mode: RouterMode::Fragment,
            base: String::new(),
            backend: None,
            fallback: true,
        }
    }
}

impl std::fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOptions")
            .field("routes", &self.routes.len())
            .field("mode", &self.mode)
            .field("base", &self.base)
            .field("backend", &self.backend.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// The result of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The normalized location.
    pub location: Location,
    /// The route it matches.
    pub route: Route,
    /// A writable href, base- and mode-aware (`#`-prefixed in fragment
    /// mode).
    pub href: String,
}

/// Unregisters a previously registered guard, hook, or listener.
///
/// Dropping the handle keeps the registration alive; call
/// [`HookHandle::unregister`] to remove it.
pub struct HookHandle {
    remove: Box<dyn FnOnce() + Send>,
}

impl HookHandle {
    fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Box::new(remove),
        }
    }

    /// Removes the registration.
    pub fn unregister(self) {
        (self.remove)();
    }
}

impl std::fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HookHandle")
    }
}

/// A router instance: one route map, one history strategy, one current
/// route.
#[derive(Debug)]
pub struct Router {
    matcher: Arc<Matcher>,
    engine: Arc<TransitionEngine>,
    mode: RouterMode,
    base: String,
}

impl Router {
    /// Builds a router, selecting the history strategy once by capability
    /// detection: a `UrlPath` request without push-state support falls
    /// back to `Fragment` (unless `fallback` is off), and without any
    /// backend the router runs `InMemory`.
    pub fn new(options: RouterOptions) -> Result<Self, RouterError> {
        let matcher = Arc::new(Matcher::new(&options.routes)?);

        let mut mode = options.mode;
        if mode == RouterMode::UrlPath
            && options.fallback
            && !options
                .backend
                .as_ref()
                .is_some_and(|backend| backend.supports_push_state())
        {
            mode = RouterMode::Fragment;
        }

        let strategy = match (mode, &options.backend) {
            (RouterMode::UrlPath, Some(backend)) => HistoryStrategy::UrlPath(UrlHistory::new(
                Arc::clone(backend),
                options.base.clone(),
            )),
            (RouterMode::Fragment, Some(backend)) => HistoryStrategy::Fragment(HashHistory::new(
                Arc::clone(backend),
                options.base.clone(),
            )),
            _ => {
                mode = RouterMode::InMemory;
                HistoryStrategy::InMemory(MemoryHistory::new())
            }
        };

        let engine = TransitionEngine::new(Arc::clone(&matcher), strategy);
        Ok(Self {
            matcher,
            engine,
            mode,
            base: options.base,
        })
    }

    /// The strategy the router settled on.
    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    /// Snapshot of the currently committed route.
    pub fn current_route(&self) -> Route {
        self.engine.current()
    }

    /// Whether the first transition has completed.
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Resolves a raw location to a route without navigating.
    pub fn match_location(
        &self,
        raw: impl Into<RawLocation>,
        current: Option<&Route>,
    ) -> Result<Route, RouterError> {
        let current_route = current.cloned().unwrap_or_else(|| self.engine.current());
        self.matcher.match_location(&raw.into(), Some(&current_route))
    }

    /// Resolves a raw location to its normalized form, matched route, and
    /// writable href.
    pub fn resolve(
        &self,
        raw: impl Into<RawLocation>,
        current: Option<&Route>,
        append: bool,
    ) -> Result<Resolved, RouterError> {
        let current_route = current.cloned().unwrap_or_else(|| self.engine.current());
        let location = normalize_location(&raw.into(), Some(&current_route), append);
        let route = self
            .matcher
            .match_location(&RawLocation::Location(location.clone()), Some(&current_route))?;
        // An href for a redirecting route points at where navigation
        // started, not where it lands.
        let full_path = route
            .redirected_from
            .clone()
            .unwrap_or_else(|| route.full_path.clone());
        let href = create_href(&self.base, &full_path, self.mode);
        Ok(Resolved {
            location,
            route,
            href,
        })
    }

    /// Navigates to a new location, pushing a history entry. Resolves with
    /// the committed route, or the failure that stopped the navigation.
    pub async fn push(
        &self,
        raw: impl Into<RawLocation>,
    ) -> Result<Route, NavigationFailure> {
        self.navigate_deferred(raw.into(), UrlWrite::Push).await
    }

    /// Navigates to a new location, replacing the current history entry.
    pub async fn replace(
        &self,
        raw: impl Into<RawLocation>,
    ) -> Result<Route, NavigationFailure> {
        self.navigate_deferred(raw.into(), UrlWrite::Replace).await
    }

    /// Callback form of [`Router::push`]. A superseded transition invokes
    /// neither callback.
    pub async fn push_with_callbacks(
        &self,
        raw: impl Into<RawLocation>,
        on_complete: Option<CompleteCallback>,
        on_abort: Option<AbortCallback>,
    ) {
        self.engine
            .navigate(raw.into(), UrlWrite::Push, on_complete, on_abort)
            .await;
    }

    /// Callback form of [`Router::replace`].
    pub async fn replace_with_callbacks(
        &self,
        raw: impl Into<RawLocation>,
        on_complete: Option<CompleteCallback>,
        on_abort: Option<AbortCallback>,
    ) {
        self.engine
            .navigate(raw.into(), UrlWrite::Replace, on_complete, on_abort)
            .await;
    }

    async fn navigate_deferred(
        &self,
        raw: RawLocation,
        write: UrlWrite,
    ) -> Result<Route, NavigationFailure> {
        let (tx, rx) = oneshot::channel::<Result<Route, NavigationFailure>>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let tx_complete = Arc::clone(&tx);
        let on_complete: CompleteCallback = Box::new(move |route: &Route| {
            if let Some(tx) = tx_complete.lock().expect("channel lock poisoned").take() {
                let _ = tx.send(Ok(route.clone()));
            }
        });
        let tx_abort = Arc::clone(&tx);
        let on_abort: AbortCallback = Box::new(move |failure| {
            if let Some(tx) = tx_abort.lock().expect("channel lock poisoned").take() {
                let _ = tx.send(Err(failure));
            }
        });

        self.engine
            .navigate(raw, write, Some(on_complete), Some(on_abort))
            .await;

        match rx.await {
            Ok(result) => result,
            // The sender was dropped without firing: the transition was
            // superseded and its callbacks discarded.
            Err(_) => Err(NavigationFailure::Superseded),
        }
    }

    /// Moves through the history stack. In-memory, this transitions to the
    /// stack entry directly; with a backend, the traversal comes back
    /// through the host's location-change signal.
    pub async fn go(&self, delta: i32) {
        match self.engine.strategy() {
            HistoryStrategy::InMemory(memory) => {
                let Some((index, location)) = memory.entry_at_offset(delta) else {
                    return;
                };
                let memory = memory.clone();
                let on_complete: CompleteCallback =
                    Box::new(move |_route: &Route| memory.set_index(index));
                self.engine
                    .navigate(
                        RawLocation::Path(location),
                        UrlWrite::Ensure,
                        Some(on_complete),
                        None,
                    )
                    .await;
            }
            HistoryStrategy::UrlPath(history) => history.go(delta),
            HistoryStrategy::Fragment(history) => history.go(delta),
        }
    }

    /// Moves one entry back.
    pub async fn back(&self) {
        self.go(-1).await;
    }

    /// Moves one entry forward.
    pub async fn forward(&self) {
        self.go(1).await;
    }

    /// Transitions to whatever the strategy currently reads. Call once at
    /// startup, and from the host's listener whenever the location changes
    /// externally (the back/forward signal).
    pub async fn handle_location_change(&self) {
        let location = self.engine.strategy().current_location();
        self.engine
            .navigate(RawLocation::Path(location), UrlWrite::Ensure, None, None)
            .await;
    }

    /// Merges additional routes into the existing map, then re-resolves
    /// the current location so a previously unmatched route can take
    /// effect.
    pub async fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), RouterError> {
        self.matcher.add_routes(routes)?;
        if !self.engine.current().is_start() {
            self.handle_location_change().await;
        }
        Ok(())
    }

    /// Registers a global before hook, run ahead of every guard pipeline.
    pub fn before_each(&self, guard: Guard) -> HookHandle {
        let id = self.engine.add_before_hook(guard);
        let engine = Arc::clone(&self.engine);
        HookHandle::new(move || engine.remove_before_hook(id))
    }

    /// Registers a global resolve hook, run after component resolution,
    /// just before commit.
    pub fn before_resolve(&self, guard: Guard) -> HookHandle {
        let id = self.engine.add_resolve_hook(guard);
        let engine = Arc::clone(&self.engine);
        HookHandle::new(move || engine.remove_resolve_hook(id))
    }

    /// Registers a global after hook, fired after commit; it cannot abort.
    pub fn after_each(&self, hook: AfterHook) -> HookHandle {
        let id = self.engine.add_after_hook(hook);
        let engine = Arc::clone(&self.engine);
        HookHandle::new(move || engine.remove_after_hook(id))
    }

    /// Registers a route-change listener, notified synchronously on every
    /// commit (used to propagate into dependent reactive state).
    pub fn listen(&self, listener: Listener) -> HookHandle {
        let id = self.engine.add_listener(listener);
        let engine = Arc::clone(&self.engine);
        HookHandle::new(move || engine.remove_listener(id))
    }

    /// Registers an error hook, notified of guard failures.
    pub fn on_error(&self, hook: ErrorHook) -> HookHandle {
        let id = self.engine.add_error_hook(hook);
        let engine = Arc::clone(&self.engine);
        HookHandle::new(move || engine.remove_error_hook(id))
    }

    /// Queues callbacks for the completion of the first transition; they
    /// flush exactly once, on success or on error.
    pub fn on_ready(&self, cb: ReadyCallback, error_cb: Option<ReadyErrorCallback>) {
        self.engine.on_ready(cb, error_cb);
    }

    /// The components backing a location's matched chain (the current
    /// route's when no location is given). Lazy components appear only
    /// once resolved.
    pub fn matched_components(&self, raw: Option<RawLocation>) -> Vec<Component> {
        let route = match raw {
            Some(raw) => match self.resolve(raw, None, false) {
                Ok(resolved) => resolved.route,
                Err(_) => return Vec::new(),
            },
            None => self.engine.current(),
        };
        route
            .matched
            .iter()
            .flat_map(|record| record.components.values().filter_map(|entry| entry.get()))
            .collect()
    }

    /// Snapshot of the ordered path list, in match-priority order.
    pub fn paths(&self) -> Vec<String> {
        self.matcher.paths()
    }
}

fn create_href(base: &str, full_path: &str, mode: RouterMode) -> String {
    let path = if mode == RouterMode::Fragment {
        format!("#{full_path}")
    } else {
        full_path.to_string()
    };
    if base.is_empty() {
        path
    } else {
        clean_path(&format!("{base}/{path}"))
    }
}
