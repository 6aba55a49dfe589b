//! Query-string parsing and serialization.
//!
//! Queries are ordered multi-valued maps: repeated keys accumulate values
//! instead of overwriting (`?tag=a&tag=b` → `tag: ["a", "b"]`). Keys and
//! values are percent-decoded on parse and re-encoded on serialization.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// A parsed query string. Repeated keys hold every value in order.
pub type Query = BTreeMap<String, Vec<String>>;

fn decode(input: &str) -> String {
    match urlencoding::decode(input) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            tracing::warn!("error decoding query component {input:?}, using raw value");
            input.to_string()
        }
    }
}

/// Parses a raw query string (without the leading `?`) into a [`Query`].
///
/// Pairs are `&`-delimited; a pair without `=` becomes a key with an empty
/// value. `+` is not treated specially (callers encode spaces as `%20`).
///
/// # Examples
///
/// ```
/// use interpunct::query::parse_query;
///
/// let query = parse_query("a=1&b=two&a=3");
/// assert_eq!(query["a"], vec!["1", "3"]);
/// assert_eq!(query["b"], vec!["two"]);
/// ```
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    let raw = raw.trim_start_matches(['?', '#', '&']);
    if raw.is_empty() {
        return query;
    }

    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        };
        query.entry(key).or_default().push(value);
    }

    query
}

/// Serializes a [`Query`] back to a string, `?`-prefixed, or empty when the
/// query has no entries.
///
/// Values are percent-encoded. An empty value serializes as the bare key, so
/// `?flag` round-trips.
///
/// # Examples
///
/// ```
/// use interpunct::query::{parse_query, stringify_query};
///
/// let query = parse_query("b=2&a=1&a=3");
/// assert_eq!(stringify_query(&query), "?a=1&a=3&b=2");
/// assert_eq!(stringify_query(&Default::default()), "");
/// ```
pub fn stringify_query(query: &Query) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for (key, values) in query {
        let key: Cow<'_, str> = urlencoding::encode(key);
        for value in values {
            if value.is_empty() {
                pairs.push(key.to_string());
            } else {
                pairs.push(format!("{key}={}", urlencoding::encode(value)));
            }
        }
    }

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Merges a raw query string with explicit extra values; the explicit values
/// win on key collision.
///
/// Used when normalizing a location that carries both a `?query` suffix in
/// its path and a structured query map.
pub fn resolve_query(raw: &str, extra: &Query) -> Query {
    let mut query = parse_query(raw);
    for (key, values) in extra {
        query.insert(key.clone(), values.clone());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_repeated_keys() {
        let query = parse_query("tag=a&tag=b&tag=c");
        assert_eq!(query["tag"], vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_bare_key() {
        let query = parse_query("flag&a=1");
        assert_eq!(query["flag"], vec![""]);
        assert_eq!(query["a"], vec!["1"]);
    }

    #[test]
    fn test_parse_percent_decoding() {
        let query = parse_query("name=hello%20world");
        assert_eq!(query["name"], vec!["hello world"]);
    }

    #[test]
    fn test_stringify_round_trip() {
        let query = parse_query("a=1&b=hello%20world&flag");
        let serialized = stringify_query(&query);
        assert_eq!(parse_query(serialized.trim_start_matches('?')), query);
    }

    #[test]
    fn test_resolve_query_extra_wins() {
        let mut extra = Query::new();
        extra.insert("a".to_string(), vec!["override".to_string()]);
        let merged = resolve_query("a=1&b=2", &extra);
        assert_eq!(merged["a"], vec!["override"]);
        assert_eq!(merged["b"], vec!["2"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_query("").is_empty());
        assert_eq!(stringify_query(&Query::new()), "");
    }
}
