//! Integration tests for the transition engine and history strategies.
//!
//! Covers:
//! - Guard pipeline ordering and short-circuiting
//! - Abort, redirect, and failure outcomes
//! - Last-issued-wins staleness for overlapping transitions
//! - Async component resolution
//! - Ready callbacks, listeners, and after hooks
//! - In-memory history traversal and dynamic route registration
//! - Fragment strategy reconciliation through a host backend

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use interpunct::{
    async_guard, guard, Component, ComponentSource, GuardOutcome, Location, LocationBackend,
    NavigationFailure, RouteConfig, Router, RouterMode, RouterOptions,
};
use pretty_assertions::assert_eq;

fn page(path: &str) -> RouteConfig {
    RouteConfig::new(path).with_component(Component::new(path.len()))
}

fn router(routes: Vec<RouteConfig>) -> Arc<Router> {
    Arc::new(
        Router::new(RouterOptions {
            routes,
            ..RouterOptions::default()
        })
        .unwrap(),
    )
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn log(&self, label: &str) {
        self.0.lock().unwrap().push(label.to_string());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

#[tokio::test]
async fn test_push_commits_and_updates_current() {
    let router = router(vec![page("/a"), page("/b")]);
    let route = router.push("/a").await.unwrap();
    assert_eq!(route.full_path, "/a");
    assert_eq!(router.current_route().full_path, "/a");
}

#[tokio::test]
async fn test_aborting_guard_leaves_current_unchanged() {
    let blocked = page("/blocked").with_before_enter(guard(|_, _| GuardOutcome::Abort));
    let router = router(vec![page("/open"), blocked]);

    router.push("/open").await.unwrap();
    let err = router.push("/blocked").await.unwrap_err();
    assert!(matches!(err, NavigationFailure::Aborted { .. }));
    assert_eq!(router.current_route().full_path, "/open");
}

#[tokio::test]
async fn test_failing_guard_reaches_error_hooks() {
    let failing = page("/broken")
        .with_before_enter(guard(|_, _| GuardOutcome::fail(anyhow::anyhow!("boom"))));
    let router = router(vec![page("/open"), failing]);

    let seen = Arc::new(AtomicBool::new(false));
    let seen_hook = Arc::clone(&seen);
    let _handle = router.on_error(Arc::new(move |failure| {
        assert!(matches!(failure, NavigationFailure::Guard(_)));
        seen_hook.store(true, Ordering::SeqCst);
    }));

    router.push("/open").await.unwrap();
    let err = router.push("/broken").await.unwrap_err();
    assert!(matches!(err, NavigationFailure::Guard(_)));
    assert!(seen.load(Ordering::SeqCst));
    assert_eq!(router.current_route().full_path, "/open");
}

#[tokio::test]
async fn test_redirecting_guard_restarts_transition() {
    let old = page("/old").with_before_enter(guard(|_, _| GuardOutcome::redirect("/new")));
    let router = router(vec![old, page("/new")]);

    let route = router.push("/old").await.unwrap();
    assert_eq!(route.full_path, "/new");
    assert_eq!(router.current_route().full_path, "/new");
}

#[tokio::test]
async fn test_guard_pipeline_order() {
    let recorder = Recorder::default();

    let r = recorder.clone();
    let parent = page("/parent").with_update_hook(guard(move |_, _| {
        r.log("update:parent");
        GuardOutcome::Proceed
    }));
    let r = recorder.clone();
    let child_one = page("one").with_leave_hook(guard(move |_, _| {
        r.log("leave:one");
        GuardOutcome::Proceed
    }));
    let r1 = recorder.clone();
    let r2 = recorder.clone();
    let child_two = page("two")
        .with_before_enter(guard(move |_, _| {
            r1.log("beforeEnter:two");
            GuardOutcome::Proceed
        }))
        .with_enter_hook(guard(move |_, _| {
            r2.log("enter:two");
            GuardOutcome::Proceed
        }));

    let router = router(vec![parent.with_child(child_one).with_child(child_two)]);

    let r = recorder.clone();
    let _before = router.before_each(guard(move |_, _| {
        r.log("before:global");
        GuardOutcome::Proceed
    }));
    let r = recorder.clone();
    let _resolve = router.before_resolve(guard(move |_, _| {
        r.log("resolve:global");
        GuardOutcome::Proceed
    }));
    let r = recorder.clone();
    let _listener = router.listen(Arc::new(move |_| r.log("listener")));
    let r = recorder.clone();
    let _after = router.after_each(Arc::new(move |_, _| r.log("after:global")));

    router.push("/parent/one").await.unwrap();
    recorder.take();

    router.push("/parent/two").await.unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "leave:one",
            "before:global",
            "update:parent",
            "beforeEnter:two",
            "enter:two",
            "resolve:global",
            "listener",
            "after:global",
        ]
    );
}

#[tokio::test]
async fn test_unregistered_hook_no_longer_runs() {
    let router = router(vec![page("/a"), page("/b")]);
    let count = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&count);
    let handle = router.before_each(guard(move |_, _| {
        hook_count.fetch_add(1, Ordering::SeqCst);
        GuardOutcome::Proceed
    }));

    router.push("/a").await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    handle.unregister();
    router.push("/b").await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_overlapping_transitions_last_issued_wins() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let guard_gate = Arc::clone(&gate);
    let slow = page("/slow").with_before_enter(async_guard(move |_, _| {
        let gate = Arc::clone(&guard_gate);
        Box::pin(async move {
            gate.notified().await;
            GuardOutcome::Proceed
        })
    }));
    let router = router(vec![slow, page("/fast")]);

    let a_called = Arc::new(AtomicBool::new(false));
    let complete_flag = Arc::clone(&a_called);
    let abort_flag = Arc::clone(&a_called);
    let spawned = Arc::clone(&router);
    let a_task = tokio::spawn(async move {
        spawned
            .push_with_callbacks(
                "/slow",
                Some(Box::new(move |_| complete_flag.store(true, Ordering::SeqCst))),
                Some(Box::new(move |_| abort_flag.store(true, Ordering::SeqCst))),
            )
            .await;
    });

    // Let the first transition reach its suspended guard, then supersede it.
    tokio::task::yield_now().await;
    router.push("/fast").await.unwrap();

    gate.notify_one();
    a_task.await.unwrap();

    assert_eq!(router.current_route().full_path, "/fast");
    assert!(!a_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_superseded_deferred_push_resolves_superseded() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let guard_gate = Arc::clone(&gate);
    let slow = page("/slow").with_before_enter(async_guard(move |_, _| {
        let gate = Arc::clone(&guard_gate);
        Box::pin(async move {
            gate.notified().await;
            GuardOutcome::Proceed
        })
    }));
    let router = router(vec![slow, page("/fast")]);

    let spawned = Arc::clone(&router);
    let a_task = tokio::spawn(async move { spawned.push("/slow").await });

    tokio::task::yield_now().await;
    router.push("/fast").await.unwrap();
    gate.notify_one();

    let result = a_task.await.unwrap();
    assert!(matches!(result, Err(NavigationFailure::Superseded)));
}

#[tokio::test]
async fn test_same_route_skips_guard_pipeline() {
    let count = Arc::new(AtomicUsize::new(0));
    let guard_count = Arc::clone(&count);
    let counted = page("/a").with_before_enter(guard(move |_, _| {
        guard_count.fetch_add(1, Ordering::SeqCst);
        GuardOutcome::Proceed
    }));
    let router = router(vec![counted]);

    router.push("/a").await.unwrap();
    let again = router.push("/a").await.unwrap();
    assert_eq!(again.full_path, "/a");
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lazy_component_resolves_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let load_count = Arc::clone(&loads);
    let lazy = RouteConfig::new("/lazy").with_component(ComponentSource::lazy(move || {
        let load_count = Arc::clone(&load_count);
        Box::pin(async move {
            load_count.fetch_add(1, Ordering::SeqCst);
            Ok(Component::new(99u32))
        })
    }));
    let router = router(vec![lazy, page("/other")]);

    router.push("/lazy").await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    let components = router.matched_components(None);
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].downcast_ref::<u32>(), Some(&99));

    router.push("/other").await.unwrap();
    router.push("/lazy").await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_component_load_aborts_transition() {
    let lazy = RouteConfig::new("/lazy").with_component(ComponentSource::lazy(|| {
        Box::pin(async { Err(anyhow::anyhow!("load failed")) })
    }));
    let router = router(vec![page("/open"), lazy]);

    router.push("/open").await.unwrap();
    let err = router.push("/lazy").await.unwrap_err();
    assert!(matches!(err, NavigationFailure::Guard(_)));
    assert_eq!(router.current_route().full_path, "/open");
}

#[tokio::test]
async fn test_ready_callbacks_flush_once_on_first_completion() {
    let router = router(vec![page("/a"), page("/b")]);
    let count = Arc::new(AtomicUsize::new(0));

    let ready_count = Arc::clone(&count);
    router.on_ready(Box::new(move |_| {
        ready_count.fetch_add(1, Ordering::SeqCst);
    }), None);
    assert!(!router.is_ready());

    router.push("/a").await.unwrap();
    router.push("/b").await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Registration after readiness invokes immediately.
    let late_count = Arc::clone(&count);
    router.on_ready(Box::new(move |route| {
        assert_eq!(route.full_path, "/b");
        late_count.fetch_add(1, Ordering::SeqCst);
    }), None);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_memory_history_go_back_and_forward() {
    let router = router(vec![page("/a"), page("/b")]);
    router.push("/a").await.unwrap();
    router.push("/b").await.unwrap();

    router.back().await;
    assert_eq!(router.current_route().full_path, "/a");

    router.forward().await;
    assert_eq!(router.current_route().full_path, "/b");

    // Out-of-bounds traversal is ignored.
    router.go(5).await;
    assert_eq!(router.current_route().full_path, "/b");
}

#[tokio::test]
async fn test_memory_push_truncates_forward_entries() {
    let router = router(vec![page("/a"), page("/b"), page("/c")]);
    router.push("/a").await.unwrap();
    router.push("/b").await.unwrap();
    router.back().await;
    router.push("/c").await.unwrap();

    router.back().await;
    assert_eq!(router.current_route().full_path, "/a");
    router.forward().await;
    assert_eq!(router.current_route().full_path, "/c");
}

#[tokio::test]
async fn test_replace_keeps_history_depth() {
    let router = router(vec![page("/a"), page("/b")]);
    router.push("/a").await.unwrap();
    router.replace("/b").await.unwrap();

    // Nothing to go back to: /b replaced /a.
    router.back().await;
    assert_eq!(router.current_route().full_path, "/b");
}

#[tokio::test]
async fn test_add_routes_re_resolves_current_location() {
    let router = router(vec![page("/a")]);
    router.push("/later").await.unwrap();
    assert!(router.current_route().matched.is_empty());

    router.add_routes(&[page("/later")]).await.unwrap();
    assert!(!router.current_route().matched.is_empty());
    assert_eq!(router.current_route().full_path, "/later");
}

struct FakeBackend {
    location: Mutex<String>,
}

impl FakeBackend {
    fn at(location: &str) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(location.to_string()),
        })
    }

    fn set(&self, location: &str) {
        *self.location.lock().unwrap() = location.to_string();
    }
}

impl LocationBackend for FakeBackend {
    fn read(&self) -> String {
        self.location.lock().unwrap().clone()
    }
    fn push_state(&self, url: &str) {
        self.set(url);
    }
    fn replace_state(&self, url: &str) {
        self.set(url);
    }
    fn go(&self, _delta: i32) {}
}

fn fragment_router(routes: Vec<RouteConfig>, backend: Arc<FakeBackend>) -> Arc<Router> {
    Arc::new(
        Router::new(RouterOptions {
            routes,
            mode: RouterMode::Fragment,
            backend: Some(backend),
            ..RouterOptions::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_fragment_strategy_writes_and_reads_hash() {
    let backend = FakeBackend::at("#/");
    let router = fragment_router(vec![page("/"), page("/user/:id")], Arc::clone(&backend));

    router.push("/user/1").await.unwrap();
    assert_eq!(backend.read(), "#/user/1");

    // External change (a back/forward signal) comes in through the host
    // listener.
    backend.set("#/");
    router.handle_location_change().await;
    assert_eq!(router.current_route().full_path, "/");
}

#[tokio::test]
async fn test_aborted_external_navigation_reverts_url() {
    let backend = FakeBackend::at("#/open");
    let blocked = page("/blocked").with_before_enter(guard(|_, _| GuardOutcome::Abort));
    let router = fragment_router(vec![page("/open"), blocked], Arc::clone(&backend));

    router.handle_location_change().await;
    assert_eq!(router.current_route().full_path, "/open");

    backend.set("#/blocked");
    router.handle_location_change().await;
    assert_eq!(router.current_route().full_path, "/open");
    assert_eq!(backend.read(), "#/open");
}

#[test]
fn test_mode_capability_detection() {
    let no_backend = Router::new(RouterOptions {
        routes: vec![page("/")],
        mode: RouterMode::UrlPath,
        ..RouterOptions::default()
    })
    .unwrap();
    assert_eq!(no_backend.mode(), RouterMode::InMemory);

    struct NoPushState;
    impl LocationBackend for NoPushState {
        fn read(&self) -> String {
            "/".to_string()
        }
        fn push_state(&self, _url: &str) {}
        fn replace_state(&self, _url: &str) {}
        fn go(&self, _delta: i32) {}
        fn supports_push_state(&self) -> bool {
            false
        }
    }

    let fallback = Router::new(RouterOptions {
        routes: vec![page("/")],
        mode: RouterMode::UrlPath,
        backend: Some(Arc::new(NoPushState)),
        ..RouterOptions::default()
    })
    .unwrap();
    assert_eq!(fallback.mode(), RouterMode::Fragment);
}

#[tokio::test]
async fn test_resolve_href_in_fragment_mode() {
    let backend = FakeBackend::at("#/");
    let router = fragment_router(vec![page("/user/:id").with_name("user")], backend);
    let resolved = router
        .resolve(Location::named("user").with_param("id", "3"), None, false)
        .unwrap();
    assert_eq!(resolved.href, "#/user/3");
}
