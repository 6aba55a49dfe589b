//! The navigation transition engine and its history strategies.
//!
//! [`TransitionEngine`] is the state machine every strategy shares: it
//! resolves a raw target through the matcher, drains the guard pipeline in
//! order, and atomically commits the new route only if no guard aborts,
//! redirects, or fails. Overlapping transitions are coalesced last-wins
//! through a generation token: a superseded transition's guards keep
//! running, but every side-effecting continuation is gated on the token
//! and its callbacks are never invoked.
//!
//! The concrete strategies supply the location read/write primitives:
//! URL-path and fragment strategies wrap a host-injected
//! [`LocationBackend`], the in-memory strategy keeps its own stack.

pub mod hash;
pub mod memory;
pub mod url;

pub use hash::HashHistory;
pub use memory::MemoryHistory;
pub use url::UrlHistory;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use futures::future::BoxFuture;

use crate::error::NavigationFailure;
use crate::guard::{AfterHook, Guard, GuardOutcome, Listener};
use crate::location::{wants_replace, RawLocation};
use crate::matcher::Matcher;
use crate::record::RouteRecord;
use crate::route::{is_same_route, Route};

/// Host-supplied location primitives for the URL-path and fragment
/// strategies.
///
/// `read` returns the app-relative location (`path?query#hash`, including
/// the configured base) in decoded form; `push_state`/`replace_state`
/// write a location without triggering a transition. External navigation
/// (a back/forward signal) must be wired by the host to
/// `Router::handle_location_change`.
pub trait LocationBackend: Send + Sync {
    /// The current location string.
    fn read(&self) -> String;
    /// Pushes a new history entry.
    fn push_state(&self, url: &str);
    /// Replaces the current history entry.
    fn replace_state(&self, url: &str);
    /// Moves through the history stack; the resulting location change is
    /// reported back through the host's listener.
    fn go(&self, delta: i32);
    /// Whether the environment supports push-state writes. A URL-path
    /// router falls back to the fragment strategy when it does not.
    fn supports_push_state(&self) -> bool {
        true
    }
}

/// The navigation strategy, selected once at router construction.
///
/// Tagged variants over one capability surface, not inheritance: each
/// variant supplies "read current location" and "write location".
#[derive(Clone)]
pub enum HistoryStrategy {
    /// Locations live in the URL path (`/user/1`).
    UrlPath(UrlHistory),
    /// Locations live in the fragment (`#/user/1`).
    Fragment(HashHistory),
    /// Locations live in an in-process stack; no host backend.
    InMemory(MemoryHistory),
}

impl HistoryStrategy {
    /// Reads the current location as a `path?query#hash` string.
    pub fn current_location(&self) -> String {
        match self {
            Self::UrlPath(history) => history.current_location(),
            Self::Fragment(history) => history.current_location(),
            Self::InMemory(history) => history.current_location(),
        }
    }

    pub(crate) fn push(&self, full_path: &str) {
        match self {
            Self::UrlPath(history) => history.push(full_path),
            Self::Fragment(history) => history.push(full_path),
            Self::InMemory(history) => history.push(full_path),
        }
    }

    pub(crate) fn replace(&self, full_path: &str) {
        match self {
            Self::UrlPath(history) => history.replace(full_path),
            Self::Fragment(history) => history.replace(full_path),
            Self::InMemory(history) => history.replace(full_path),
        }
    }
}

impl std::fmt::Debug for HistoryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UrlPath(_) => f.write_str("HistoryStrategy::UrlPath"),
            Self::Fragment(_) => f.write_str("HistoryStrategy::Fragment"),
            Self::InMemory(_) => f.write_str("HistoryStrategy::InMemory"),
        }
    }
}

/// How a committed transition writes the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlWrite {
    /// Push a new history entry.
    Push,
    /// Replace the current history entry.
    Replace,
    /// Only reconcile: the location already changed externally.
    Ensure,
}

/// Invoked with the committed route when a navigation succeeds.
pub type CompleteCallback = Box<dyn FnOnce(&Route) + Send>;
/// Invoked with the failure when a navigation aborts or errors.
pub type AbortCallback = Box<dyn FnOnce(NavigationFailure) + Send>;
/// Queued until the first transition completes successfully.
pub type ReadyCallback = Box<dyn FnOnce(&Route) + Send>;
/// Queued until the first transition completes with an error.
pub type ReadyErrorCallback = Box<dyn FnOnce(&NavigationFailure) + Send>;
/// Notified of every guard failure routed through the engine.
pub type ErrorHook = Arc<dyn Fn(&NavigationFailure) + Send + Sync>;

enum Flow {
    Proceed,
    Stale,
    Abort,
    Redirect(RawLocation),
    Fail(NavigationFailure),
}

/// The shared transition state machine.
pub struct TransitionEngine {
    matcher: Arc<Matcher>,
    strategy: HistoryStrategy,
    current: RwLock<Route>,
    generation: AtomicU64,
    hook_id: AtomicU64,
    before_hooks: Mutex<Vec<(u64, Guard)>>,
    resolve_hooks: Mutex<Vec<(u64, Guard)>>,
    after_hooks: Mutex<Vec<(u64, AfterHook)>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    error_hooks: Mutex<Vec<(u64, ErrorHook)>>,
    ready: AtomicBool,
    ready_cbs: Mutex<Vec<ReadyCallback>>,
    ready_error_cbs: Mutex<Vec<ReadyErrorCallback>>,
}

fn push_entry<T>(list: &Mutex<Vec<(u64, T)>>, counter: &AtomicU64, item: T) -> u64 {
    let id = counter.fetch_add(1, Ordering::SeqCst);
    list.lock().expect("hook list lock poisoned").push((id, item));
    id
}

fn remove_entry<T>(list: &Mutex<Vec<(u64, T)>>, id: u64) {
    list.lock()
        .expect("hook list lock poisoned")
        .retain(|(entry_id, _)| *entry_id != id);
}

fn snapshot<T: Clone>(list: &Mutex<Vec<(u64, T)>>) -> Vec<T> {
    list.lock()
        .expect("hook list lock poisoned")
        .iter()
        .map(|(_, item)| item.clone())
        .collect()
}

impl TransitionEngine {
    pub(crate) fn new(matcher: Arc<Matcher>, strategy: HistoryStrategy) -> Arc<Self> {
        Arc::new(Self {
            matcher,
            strategy,
            current: RwLock::new(Route::start()),
            generation: AtomicU64::new(0),
            hook_id: AtomicU64::new(0),
            before_hooks: Mutex::new(Vec::new()),
            resolve_hooks: Mutex::new(Vec::new()),
            after_hooks: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            error_hooks: Mutex::new(Vec::new()),
            ready: AtomicBool::new(false),
            ready_cbs: Mutex::new(Vec::new()),
            ready_error_cbs: Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of the currently committed route.
    pub fn current(&self) -> Route {
        self.current
            .read()
            .expect("current route lock poisoned")
            .clone()
    }

    /// The strategy this engine writes locations through.
    pub fn strategy(&self) -> &HistoryStrategy {
        &self.strategy
    }

    /// Whether the first transition has completed (successfully or not).
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    pub(crate) fn add_before_hook(&self, guard: Guard) -> u64 {
        push_entry(&self.before_hooks, &self.hook_id, guard)
    }

    pub(crate) fn remove_before_hook(&self, id: u64) {
        remove_entry(&self.before_hooks, id);
    }

    pub(crate) fn add_resolve_hook(&self, guard: Guard) -> u64 {
        push_entry(&self.resolve_hooks, &self.hook_id, guard)
    }

    pub(crate) fn remove_resolve_hook(&self, id: u64) {
        remove_entry(&self.resolve_hooks, id);
    }

    pub(crate) fn add_after_hook(&self, hook: AfterHook) -> u64 {
        push_entry(&self.after_hooks, &self.hook_id, hook)
    }

    pub(crate) fn remove_after_hook(&self, id: u64) {
        remove_entry(&self.after_hooks, id);
    }

    pub(crate) fn add_listener(&self, listener: Listener) -> u64 {
        push_entry(&self.listeners, &self.hook_id, listener)
    }

    pub(crate) fn remove_listener(&self, id: u64) {
        remove_entry(&self.listeners, id);
    }

    pub(crate) fn add_error_hook(&self, hook: ErrorHook) -> u64 {
        push_entry(&self.error_hooks, &self.hook_id, hook)
    }

    pub(crate) fn remove_error_hook(&self, id: u64) {
        remove_entry(&self.error_hooks, id);
    }

    pub(crate) fn on_ready(
        &self,
        cb: ReadyCallback,
        error_cb: Option<ReadyErrorCallback>,
    ) {
        if self.is_ready() {
            cb(&self.current());
            return;
        }
        self.ready_cbs
            .lock()
            .expect("ready list lock poisoned")
            .push(cb);
        if let Some(error_cb) = error_cb {
            self.ready_error_cbs
                .lock()
                .expect("ready list lock poisoned")
                .push(error_cb);
        }
    }

    /// Starts a transition towards `raw`. The returned future drives the
    /// guard pipeline to completion; a transition superseded along the way
    /// resolves silently without invoking either callback.
    pub(crate) fn navigate(
        self: &Arc<Self>,
        raw: RawLocation,
        write: UrlWrite,
        on_complete: Option<CompleteCallback>,
        on_abort: Option<AbortCallback>,
    ) -> BoxFuture<'static, ()> {
        let engine = Arc::clone(self);
        Box::pin(async move { engine.run(raw, write, on_complete, on_abort).await })
    }

    async fn run(
        self: Arc<Self>,
        raw: RawLocation,
        write: UrlWrite,
        on_complete: Option<CompleteCallback>,
        on_abort: Option<AbortCallback>,
    ) {
        // Capture the generation at call time; a later navigate() bumps the
        // counter and turns this transition's continuations into no-ops.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        eprintln!("DBG run start gen={generation} raw={raw:?}");
        let from = self.current();

        let to = match self.matcher.match_location(&raw, Some(&from)) {
            Ok(route) => route,
            Err(err) => {
                let failure = NavigationFailure::Router(err);
                self.fire_error_hooks(&failure);
                self.flush_ready_error(&failure);
                if let Some(cb) = on_abort {
                    cb(failure);
                }
                return;
            }
        };

        // Navigating to the active route reconciles the URL but skips the
        // guard pipeline entirely.
        if is_same_route(&to, &from) && to.matched.len() == from.matched.len() {
            self.ensure_url(false);
            self.flush_ready(&to);
            if let Some(cb) = on_complete {
                cb(&to);
            }
            return;
        }

        let __flow = self.run_pipeline(generation, &from, &to).await;
        let __tag = match &__flow { Flow::Proceed => "Proceed", Flow::Stale => "Stale", Flow::Abort => "Abort", Flow::Redirect(_) => "Redirect", Flow::Fail(_) => "Fail" };
        eprintln!("DBG run pipeline done gen={generation} flow={__tag}");
        match __flow {
            Flow::Proceed => {
                if self.is_stale(generation) {
                    return;
                }
                self.commit(&to);
                match write {
                    UrlWrite::Push => self.strategy.push(&to.full_path),
                    UrlWrite::Replace => self.strategy.replace(&to.full_path),
                    UrlWrite::Ensure => self.ensure_url(false),
                }
                if let Some(cb) = on_complete {
                    cb(&to);
                }
                self.fire_after_hooks(&to, &from);
                self.flush_ready(&to);
            }
            Flow::Stale => {}
            Flow::Abort => {
                self.ensure_url(true);
                let failure = NavigationFailure::Aborted {
                    from: from.full_path.clone(),
                    to: to.full_path.clone(),
                };
                self.flush_ready_error(&failure);
                if let Some(cb) = on_abort {
                    cb(failure);
                }
            }
            Flow::Redirect(target) => {
                // Restart with the new target, carrying the original
                // callbacks forward so the caller observes the route the
                // navigation finally lands on.
                let next_write = if wants_replace(&target) {
                    UrlWrite::Replace
                } else {
                    write
                };
                self.navigate(target, next_write, on_complete, on_abort).await;
            }
            Flow::Fail(failure) => {
                self.fire_error_hooks(&failure);
                self.flush_ready_error(&failure);
                if let Some(cb) = on_abort {
                    cb(failure);
                }
            }
        }
    }

    /// Runs the guard pipeline for one transition, stage by stage, each
    /// stage fully drained before the next starts:
    ///
    /// 1. leave hooks of deactivated records, deepest first;
    /// 2. global before hooks, in registration order;
    /// 3. update hooks of records active in both chains;
    /// 4. route-level enter guards of activated records, root to leaf;
    /// 5. async component resolution for activated records;
    /// 6. component enter hooks of activated records;
    /// 7. global resolve hooks.
    async fn run_pipeline(&self, generation: u64, from: &Route, to: &Route) -> Flow {
        let (updated, deactivated, activated) = diff_matched(&from.matched, &to.matched);

        let leave: Vec<Guard> = deactivated
            .iter()
            .rev()
            .filter_map(|record| record.before_route_leave.clone())
            .collect();
        let flow = self.drain(generation, &leave, to, from).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let before = snapshot(&self.before_hooks);
        let flow = self.drain(generation, &before, to, from).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let update: Vec<Guard> = updated
            .iter()
            .filter_map(|record| record.before_route_update.clone())
            .collect();
        let flow = self.drain(generation, &update, to, from).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let enter: Vec<Guard> = activated
            .iter()
            .filter_map(|record| record.before_enter.clone())
            .collect();
        let flow = self.drain(generation, &enter, to, from).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let flow = self.resolve_components(generation, &activated).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let component_enter: Vec<Guard> = activated
            .iter()
            .filter_map(|record| record.before_route_enter.clone())
            .collect();
        let flow = self.drain(generation, &component_enter, to, from).await;
        if !matches!(flow, Flow::Proceed) {
            return flow;
        }

        let resolve = snapshot(&self.resolve_hooks);
        self.drain(generation, &resolve, to, from).await
    }

    async fn drain(&self, generation: u64, guards: &[Guard], to: &Route, from: &Route) -> Flow {
        for guard in guards {
            if self.is_stale(generation) {
                return Flow::Stale;
            }
            eprintln!("DBG drain gen={generation} awaiting guard");
            let __o = guard(to, from).await;
            eprintln!("DBG drain gen={generation} guard returned");
            match __o {
                GuardOutcome::Proceed => {}
                GuardOutcome::Abort => return Flow::Abort,
                GuardOutcome::Redirect(raw) => return Flow::Redirect(raw),
                GuardOutcome::Fail(err) => return Flow::Fail(NavigationFailure::Guard(err)),
            }
        }
        Flow::Proceed
    }

    async fn resolve_components(
        &self,
        generation: u64,
        activated: &[Arc<RouteRecord>],
    ) -> Flow {
        for record in activated {
            if self.is_stale(generation) {
                return Flow::Stale;
            }
            for entry in record.components.values() {
                if let Err(err) = entry.resolve().await {
                    return Flow::Fail(NavigationFailure::Guard(err));
                }
            }
        }
        Flow::Proceed
    }

    fn commit(&self, to: &Route) {
        *self
            .current
            .write()
            .expect("current route lock poisoned") = to.clone();
        for listener in snapshot(&self.listeners) {
            listener(to);
        }
    }

    /// Writes the committed route's location back when the strategy
    /// disagrees, replacing by default, pushing when reverting an external
    /// change after an abort. A no-op for the in-memory strategy.
    pub(crate) fn ensure_url(&self, push: bool) {
        if matches!(self.strategy, HistoryStrategy::InMemory(_)) {
            return;
        }
        let current = self.current();
        if self.strategy.current_location() != current.full_path {
            if push {
                self.strategy.push(&current.full_path);
            } else {
                self.strategy.replace(&current.full_path);
            }
        }
    }

    fn fire_after_hooks(&self, to: &Route, from: &Route) {
        for hook in snapshot(&self.after_hooks) {
            hook(to, from);
        }
    }

    fn fire_error_hooks(&self, failure: &NavigationFailure) {
        for hook in snapshot(&self.error_hooks) {
            hook(failure);
        }
    }

    fn flush_ready(&self, route: &Route) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            let cbs: Vec<ReadyCallback> = std::mem::take(
                &mut *self.ready_cbs.lock().expect("ready list lock poisoned"),
            );
            for cb in cbs {
                cb(route);
            }
            self.ready_error_cbs
                .lock()
                .expect("ready list lock poisoned")
                .clear();
        }
    }

    fn flush_ready_error(&self, failure: &NavigationFailure) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            let cbs: Vec<ReadyErrorCallback> = std::mem::take(
                &mut *self
                    .ready_error_cbs
                    .lock()
                    .expect("ready list lock poisoned"),
            );
            for cb in cbs {
                cb(failure);
            }
            self.ready_cbs
                .lock()
                .expect("ready list lock poisoned")
                .clear();
        }
    }
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("strategy", &self.strategy)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Diffs two matched chains positionally into (unchanged, deactivated,
/// activated) by record identity.
fn diff_matched(
    current: &[Arc<RouteRecord>],
    next: &[Arc<RouteRecord>],
) -> (
    Vec<Arc<RouteRecord>>,
    Vec<Arc<RouteRecord>>,
    Vec<Arc<RouteRecord>>,
) {
    let mut i = 0;
    while i < current.len() && i < next.len() && Arc::ptr_eq(&current[i], &next[i]) {
        i += 1;
    }
    (
        next[..i].to_vec(),
        current[i..].to_vec(),
        next[i..].to_vec(),
    )
}
