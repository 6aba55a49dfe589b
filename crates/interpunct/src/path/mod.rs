//! Path utilities for resolution and normalization.
//!
//! All functions are pure: given the same input, always produce the same
//! output with no side effects.

/// A path split into its path, query, and hash parts.
///
/// `hash` keeps its leading `#`; `query` excludes its leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPath {
    /// The path part, up to the first `?` or `#`.
    pub path: String,
    /// The raw query string, without the leading `?`.
    pub query: String,
    /// The hash fragment, including the leading `#`, or empty.
    pub hash: String,
}

/// Resolves a relative path against a base path.
///
/// Rules:
/// - a path starting with `/` is already absolute and returned unchanged;
/// - a path starting with `?` or `#` is concatenated directly onto `base`;
/// - otherwise `base` is split into a segment stack, the trailing segment is
///   popped unless `append` is set and the last segment is non-empty, and the
///   relative segments are applied left to right (`..` pops, `.` is ignored,
///   anything else pushes). The result always has a leading `/`.
///
/// # Examples
///
/// ```
/// use interpunct::path::resolve_path;
///
/// assert_eq!(resolve_path("/bar", "/foo", false), "/bar");
/// assert_eq!(resolve_path("../x", "/a/b/c", false), "/a/x");
/// assert_eq!(resolve_path("./x", "/a/b/", false), "/a/b/x");
/// assert_eq!(resolve_path("x", "/a/b", true), "/a/b/x");
/// assert_eq!(resolve_path("?q=1", "/a", false), "/a?q=1");
/// ```
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?') | Some('#') => return format!("{base}{relative}"),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();

    // Remove the trailing segment unless appending to a non-empty segment.
    if !append || stack.last().is_some_and(|s| s.is_empty()) {
        stack.pop();
    }

    let relative = relative.strip_prefix('/').unwrap_or(relative);
    for segment in relative.split('/') {
        if segment == ".." {
            stack.pop();
        } else if segment != "." {
            stack.push(segment);
        }
    }

    // Ensure a leading slash.
    if stack.first().is_none_or(|s| !s.is_empty()) {
        stack.insert(0, "");
    }

    stack.join("/")
}

/// Splits a path into its path, query, and hash parts.
///
/// The hash fragment is split off first (everything from the first `#`),
/// then the query string (everything after the first `?` in what remains).
///
/// # Examples
///
/// ```
/// use interpunct::path::parse_path;
///
/// let parsed = parse_path("/bar?name=chup#top");
/// assert_eq!(parsed.path, "/bar");
/// assert_eq!(parsed.query, "name=chup");
/// assert_eq!(parsed.hash, "#top");
/// ```
pub fn parse_path(path: &str) -> ParsedPath {
    let mut path = path;
    let mut hash = "";
    let mut query = "";

    if let Some(hash_index) = path.find('#') {
        hash = &path[hash_index..];
        path = &path[..hash_index];
    }

    if let Some(query_index) = path.find('?') {
        query = &path[query_index + 1..];
        path = &path[..query_index];
    }

    ParsedPath {
        path: path.to_string(),
        query: query.to_string(),
        hash: hash.to_string(),
    }
}

/// Collapses consecutive `/` separators into one. Idempotent.
///
/// # Examples
///
/// ```
/// use interpunct::path::clean_path;
///
/// assert_eq!(clean_path("/a//b///c"), "/a/b/c");
/// assert_eq!(clean_path("/like//book"), "/like/book");
/// ```
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            prev_slash = false;
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_unchanged() {
        assert_eq!(resolve_path("/bar", "/foo/baz", false), "/bar");
    }

    #[test]
    fn test_resolve_query_and_hash_concatenate() {
        assert_eq!(resolve_path("?a=1", "/foo", false), "/foo?a=1");
        assert_eq!(resolve_path("#frag", "/foo", false), "/foo#frag");
    }

    #[test]
    fn test_resolve_parent_segments() {
        assert_eq!(resolve_path("../x", "/a/b/c", false), "/a/x");
        assert_eq!(resolve_path("../../x", "/a/b/c", false), "/x");
    }

    #[test]
    fn test_resolve_current_segment_ignored() {
        assert_eq!(resolve_path("./x", "/a/b/", false), "/a/b/x");
        assert_eq!(resolve_path("./x", "/a/b", false), "/a/x");
    }

    #[test]
    fn test_resolve_append() {
        assert_eq!(resolve_path("x", "/a/b", true), "/a/b/x");
        assert_eq!(resolve_path("x", "/a/b", false), "/a/x");
        // Appending to a trailing slash still pops the empty segment.
        assert_eq!(resolve_path("x", "/a/b/", true), "/a/b/x");
        assert_eq!(resolve_path("../x", "/a/b/c", true), "/a/b/x");
    }

    #[test]
    fn test_resolve_always_leading_slash() {
        assert_eq!(resolve_path("x", "a", false), "/x");
    }

    #[test]
    fn test_parse_path_plain() {
        let parsed = parse_path("/users/1");
        assert_eq!(parsed.path, "/users/1");
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.hash, "");
    }

    #[test]
    fn test_parse_path_query_inside_hash_stays_in_hash() {
        // The hash is split off first, so a `?` after `#` belongs to the hash.
        let parsed = parse_path("/a#b?c=d");
        assert_eq!(parsed.path, "/a");
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.hash, "#b?c=d");
    }

    #[test]
    fn test_clean_path_idempotent() {
        let once = clean_path("/a//b///c");
        assert_eq!(once, "/a/b/c");
        assert_eq!(clean_path(&once), once);
    }
}
