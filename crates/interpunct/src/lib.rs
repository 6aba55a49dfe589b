//! # Interpunct
//!
//! A client-side routing core with support for:
//! - Nested route configurations flattened into ordered lookup maps
//! - Dynamic parameters (`/user/:id`), custom patterns (`:id(\d+)`),
//!   optional segments (`:page?`), and `*` catch-alls (always tried last)
//! - Named routes, aliases, and redirects (static or computed)
//! - Guarded navigation transitions: an asynchronous, cancellable pipeline
//!   of leave/enter/update hooks that commits the new route atomically
//! - Pluggable history strategies: URL-path, fragment, and in-memory
//!
//! Overlapping navigations coalesce last-issued-wins: a superseded
//! transition's guards finish running, but its effects are discarded and
//! its callbacks never fire.
//!
//! ## Example
//!
//! ```
//! use interpunct::{Component, RouteConfig, Router, RouterOptions};
//!
//! let router = Router::new(RouterOptions {
//!     routes: vec![
//!         RouteConfig::new("/")
//!             .with_name("home")
//!             .with_component(Component::new(0u32)),
//!         RouteConfig::new("/user/:id")
//!             .with_name("user")
//!             .with_component(Component::new(1u32)),
//!     ],
//!     ..RouterOptions::default()
//! })
//! .unwrap();
//!
//! let route = futures::executor::block_on(router.push("/user/42")).unwrap();
//! assert_eq!(route.params["id"], "42");
//! assert_eq!(router.current_route().full_path, "/user/42");
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod history;
pub mod location;
mod map;
pub mod matcher;
pub mod path;
pub mod pattern;
pub mod query;
pub mod record;
pub mod route;
mod router;

pub use config::{Component, ComponentSource, LazyComponent, RedirectTarget, RouteConfig};
pub use error::{NavigationFailure, RouterError};
pub use guard::{async_guard, guard, AfterHook, Guard, GuardFuture, GuardOutcome, Listener};
pub use history::{HistoryStrategy, LocationBackend};
pub use location::{Location, RawLocation};
pub use pattern::{CompiledPattern, PatternKey, PatternOptions};
pub use query::Query;
pub use record::{RecordId, RouteRecord};
pub use route::{is_same_route, Route};
pub use router::{HookHandle, Resolved, Router, RouterMode, RouterOptions};
