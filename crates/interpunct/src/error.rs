//! Error taxonomy for map building and navigation.
//!
//! Two families: [`RouterError`] covers fatal configuration problems raised
//! at build time, [`NavigationFailure`] covers the expected outcomes of a
//! navigation that did not commit. Warning-class issues (duplicate names,
//! duplicate params, self-aliases) are not errors; they go through
//! `tracing::warn!` and execution continues with a defined fallback.

use thiserror::Error;

/// Fatal configuration errors, raised immediately at map-build time.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The route configuration is structurally invalid: missing `path`,
    /// a string-typed component, or a location with neither path nor name.
    #[error("invalid route configuration: {0}")]
    Configuration(String),

    /// A path template could not be compiled into a matcher.
    #[error("invalid path pattern {path:?}: {message}")]
    Pattern { path: String, message: String },

    /// A named navigation target declares a parameter the caller did not
    /// supply, so the path cannot be synthesized.
    #[error("missing required param {param:?} for path {path:?}")]
    MissingParam { path: String, param: String },
}

/// The ways a navigation can end without committing a new route.
///
/// These are expected control-flow outcomes, not panics: a guard aborting is
/// routed to the abort callback, a guard failing is additionally routed to
/// the registered error hooks, and a superseded transition is reported only
/// through the deferred (`async`) API — its callbacks are never invoked.
#[derive(Debug, Error)]
pub enum NavigationFailure {
    /// A guard returned `Abort`; the current route is unchanged.
    #[error("navigation from {from:?} to {to:?} aborted by a guard")]
    Aborted {
        /// Full path of the route the navigation started from.
        from: String,
        /// Full path of the route the navigation targeted.
        to: String,
    },

    /// A guard or async component resolution failed unexpectedly; the
    /// current route is unchanged.
    #[error("navigation guard failed: {0}")]
    Guard(anyhow::Error),

    /// The target location was malformed (neither path nor name).
    #[error(transparent)]
    Router(#[from] RouterError),

    /// A newer transition was issued before this one finished. Only the
    /// deferred API observes this; callback-based navigation is dropped
    /// silently, matching last-issued-wins semantics.
    #[error("navigation superseded by a newer transition")]
    Superseded,
}
