//! Fragment history strategy.
//!
//! Locations live in the hash fragment (`#/user/1`), so plain anchors
//! work in environments without push-state support. The backend sees
//! `base#full_path` strings; reads parse everything after the first `#`.

use std::sync::Arc;

use crate::history::LocationBackend;

/// Fragment-based history over a host backend.
#[derive(Clone)]
pub struct HashHistory {
    backend: Arc<dyn LocationBackend>,
    base: String,
}

impl HashHistory {
    /// Wraps a backend with an app base path (`""` for the root).
    pub fn new(backend: Arc<dyn LocationBackend>, base: impl Into<String>) -> Self {
        Self {
            backend,
            base: base.into(),
        }
    }

    /// Reads the fragment part of the current location, with a leading
    /// slash guaranteed.
    pub fn current_location(&self) -> String {
        let raw = self.backend.read();
        let fragment = raw.split_once('#').map(|(_, f)| f).unwrap_or("");
        if fragment.is_empty() {
            "/".to_string()
        } else if fragment.starts_with('/') {
            fragment.to_string()
        } else {
            format!("/{fragment}")
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
        format!("{}#{full_path}", self.base)
    }
}

impl std::fmt::Debug for HashHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashHistory")
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
    fn test_reads_fragment() {
        let history = HashHistory::new(FakeBackend::at("/index#/user/1"), "");
        assert_eq!(history.current_location(), "/user/1");
    }

    #[test]
    fn test_missing_fragment_is_root() {
        let history = HashHistory::new(FakeBackend::at("/index"), "");
        assert_eq!(history.current_location(), "/");
    }

    #[test]
    fn test_fragment_without_slash_gets_one() {
        let history = HashHistory::new(FakeBackend::at("/index#user"), "");
        assert_eq!(history.current_location(), "/user");
    }

    #[test]
    fn test_writes_fragment_form() {
        let backend = FakeBackend::at("");
        let history = HashHistory::new(backend.clone(), "/app");
        history.push("/user/1");
        assert_eq!(backend.read(), "/app#/user/1");
    }
}
