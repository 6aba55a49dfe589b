//! URL-path history strategy.
//!
//! Locations live in the URL path itself (`/user/1?tab=posts`). The
//! configured base is stripped when reading and prepended when writing;
//! the actual history writes go through the host's [`LocationBackend`].

use std::sync::Arc;

use crate::history::LocationBackend;
use crate::path::clean_path;

/// Push-state style history over a host backend.
#[derive(Clone)]
pub struct UrlHistory {
    backend: Arc<dyn LocationBackend>,
    base: String,
}

impl UrlHistory {
    /// Wraps a backend with an app base path (`""` for the root).
    pub fn new(backend: Arc<dyn LocationBackend>, base: impl Into<String>) -> Self {
        Self {
            backend,
            base: normalize_base(&base.into()),
        }
    }

    /// The normalized base path.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Reads the current location, with the base stripped and a leading
    /// slash guaranteed.
    pub fn current_location(&self) -> String {
        let raw = self.backend.read();
        let stripped = if !self.base.is_empty() && raw.starts_with(&self.base) {
            &raw[self.base.len()..]
        } else {
            raw.as_str()
        };
        if stripped.is_empty() {
            "/".to_string()
        } else if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{stripped}")
        }
    }

    pub(crate) fn push(&self, full_path: &str) {
        self.backend.push_state(&self.compose(full_path));
    }

    pub(crate) fn replace(&self, full_path: &str) {
        self.backend.replace_state(&self.compose(full_path));
    }

    /// Delegates history traversal to the backend; the resulting location
    /// change comes back through the host's listener.
    pub fn go(&self, delta: i32) {
        self.backend.go(delta);
    }

    fn compose(&self, full_path: &str) -> String {
        clean_path(&format!("{}{full_path}", self.base))
    }
}

/// Ensures the base is either empty or `/`-prefixed without a trailing
/// slash.
fn normalize_base(base: &str) -> String {
    if base.is_empty() {
        return String::new();
    }
    let base = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    base.strip_suffix('/').map(str::to_string).unwrap_or(base)
}

impl std::fmt::Debug for UrlHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlHistory")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeBackend {
        location: Mutex<String>,
    }

    impl FakeBackend {
        fn at(location: &str) -> Arc<Self> {
            Arc::new(Self {
                location: Mutex::new(location.to_string()),
            })
        }
    }

    impl LocationBackend for FakeBackend {
        fn read(&self) -> String {
            self.location.lock().unwrap().clone()
        }
        fn push_state(&self, url: &str) {
            *self.location.lock().unwrap() = url.to_string();
        }
        fn replace_state(&self, url: &str) {
            *self.location.lock().unwrap() = url.to_string();
        }
        fn go(&self, _delta: i32) {}
    }

    #[test]
    fn test_strips_base_on_read() {
        let history = UrlHistory::new(FakeBackend::at("/app/user/1?tab=posts"), "/app");
        assert_eq!(history.current_location(), "/user/1?tab=posts");
    }

    #[test]
    fn test_prepends_base_on_write() {
        let backend = FakeBackend::at("/app/");
        let history = UrlHistory::new(backend.clone(), "/app/");
        history.push("/user/1");
        assert_eq!(backend.read(), "/app/user/1");
    }

    #[test]
    fn test_empty_read_is_root() {
        let history = UrlHistory::new(FakeBackend::at("/app"), "/app");
        assert_eq!(history.current_location(), "/");
    }
}
