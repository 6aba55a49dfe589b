//! Navigation guard tasks.
//!
//! A guard is an asynchronous task invoked during a transition with the
//! target and source routes. Instead of a `next` continuation, each task
//! returns a [`GuardOutcome`]; the transition engine drains the guard
//! pipeline sequentially and short-circuits on the first non-`Proceed`
//! outcome.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::location::RawLocation;
use crate::route::Route;

/// What a guard decided about the pending transition.
#[derive(Debug)]
pub enum GuardOutcome {
    /// Advance to the next guard in the pipeline.
    Proceed,
    /// Abort the transition; the current route stays unchanged and the
    /// abort callback fires.
    Abort,
    /// Cancel the current resolution and restart the transition with a new
    /// target location.
    Redirect(RawLocation),
    /// An unexpected failure inside the guard; aborts the transition and is
    /// routed to the error hooks.
    Fail(anyhow::Error),
}

impl GuardOutcome {
    /// Shorthand for `Redirect` from anything convertible to a location.
    pub fn redirect(location: impl Into<RawLocation>) -> Self {
        Self::Redirect(location.into())
    }

    /// Shorthand for `Fail` from anything convertible to an error.
    pub fn fail(err: impl Into<anyhow::Error>) -> Self {
        Self::Fail(err.into())
    }
}

/// The future a guard invocation produces.
pub type GuardFuture = BoxFuture<'static, GuardOutcome>;

/// A registered guard: `(to, from) -> future of outcome`.
///
/// The future is `'static`, so a guard clones whatever route data it needs
/// before suspending.
pub type Guard = Arc<dyn Fn(&Route, &Route) -> GuardFuture + Send + Sync>;

/// Wraps a synchronous decision into a [`Guard`].
///
/// # Examples
///
/// ```
/// use interpunct::guard::{guard, GuardOutcome};
///
/// let block_admin = guard(|to, _from| {
///     if to.path.starts_with("/admin") {
///         GuardOutcome::Abort
///     } else {
///         GuardOutcome::Proceed
///     }
/// });
/// ```
pub fn guard<F>(f: F) -> Guard
where
    F: Fn(&Route, &Route) -> GuardOutcome + Send + Sync + 'static,
{
    Arc::new(move |to, from| {
        let outcome = f(to, from);
        Box::pin(async move { outcome })
    })
}

/// Wraps an asynchronous decision into a [`Guard`].
pub fn async_guard<F>(f: F) -> Guard
where
    F: Fn(&Route, &Route) -> GuardFuture + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A hook that runs after a committed transition. Cannot abort.
pub type AfterHook = Arc<dyn Fn(&Route, &Route) + Send + Sync>;

/// A route-change listener, notified synchronously on commit.
pub type Listener = Arc<dyn Fn(&Route) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_guard_wraps_outcome() {
        let g = guard(|_, _| GuardOutcome::Abort);
        let to = Route::start();
        let from = Route::start();
        let outcome = futures::executor::block_on(g(&to, &from));
        assert!(matches!(outcome, GuardOutcome::Abort));
    }
}
