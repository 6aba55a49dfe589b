//! Path pattern compiler.
//!
//! Compiles a normalized path template into an anchored regex with an
//! ordered list of capture keys. Templates support static segments, `:name`
//! parameters (with an optional custom pattern like `:id(\d+)` and an
//! optional-modifier `?`), and the `*` catch-all.
//!
//! Capture groups are positional, not named, so a template that repeats a
//! parameter name still compiles; the builder reports the duplicate through
//! the diagnostic channel and the last capture wins on extraction.

use std::collections::HashMap;

use regex::Regex;

use crate::error::RouterError;

/// Options controlling how a pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternOptions {
    /// Match case-sensitively. Off by default.
    pub sensitive: bool,
    /// Require an exact trailing-slash match. Off by default, which lets a
    /// trailing slash match a template without one.
    pub strict: bool,
}

/// One declared parameter of a compiled pattern, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    /// Parameter name; `pathMatch` for an unnamed `*` catch-all.
    pub name: String,
    /// Whether the parameter carries the `?` modifier.
    pub optional: bool,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    keys: Vec<PatternKey>,
}

enum Piece {
    Literal(String),
    Param {
        name: String,
        pattern: Option<String>,
        optional: bool,
    },
    Wildcard,
}

fn parse_segment(segment: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    literal.push(':');
                    continue;
                }
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }

                let mut pattern = None;
                if chars.peek() == Some(&'(') {
                    chars.next();
                    let mut depth = 1usize;
                    let mut custom = String::new();
                    for next in chars.by_ref() {
                        if next == '(' {
                            depth += 1;
                        } else if next == ')' {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        custom.push(next);
                    }
                    pattern = Some(custom);
                }

                let optional = chars.peek() == Some(&'?');
                if optional {
                    chars.next();
                }
                pieces.push(Piece::Param {
                    name,
                    pattern,
                    optional,
                });
            }
            '*' => {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Wildcard);
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    pieces
}

fn wildcard_key(index: usize) -> String {
    if index == 0 {
        "pathMatch".to_string()
    } else {
        format!("pathMatch{index}")
    }
}

fn decode_param(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            tracing::warn!("error decoding param {raw:?}, using raw value");
            raw.to_string()
        }
    }
}

impl CompiledPattern {
    /// Compiles a path template under the given options.
    pub fn compile(path: &str, options: PatternOptions) -> Result<Self, RouterError> {
        let mut keys = Vec::new();
        let mut body = String::new();
        let mut wildcards = 0usize;

        let mut push_pieces = |pieces: &[Piece], body: &mut String, keys: &mut Vec<PatternKey>| {
            for piece in pieces {
                match piece {
                    Piece::Literal(text) => body.push_str(&regex::escape(text)),
                    Piece::Param {
                        name,
                        pattern,
                        optional,
                    } => {
                        body.push('(');
                        body.push_str(pattern.as_deref().unwrap_or("[^/]+"));
                        body.push(')');
                        keys.push(PatternKey {
                            name: name.clone(),
                            optional: *optional,
                        });
                    }
                    Piece::Wildcard => {
                        body.push_str("(.*)");
                        keys.push(PatternKey {
                            name: wildcard_key(wildcards),
                            optional: false,
                        });
                        wildcards += 1;
                    }
                }
            }
        };

        if let Some(rest) = path.strip_prefix('/') {
            for segment in rest.split('/') {
                if segment.is_empty() {
                    // Root template, or an explicit trailing slash kept
                    // under `strict`.
                    body.push('/');
                    continue;
                }
                let pieces = parse_segment(segment);

                // A lone optional param makes its slash optional too, so
                // `/foo/:bar?` matches both `/foo` and `/foo/x`.
                if let [Piece::Param {
                    name,
                    pattern,
                    optional: true,
                }] = pieces.as_slice()
                {
                    body.push_str("(?:/(");
                    body.push_str(pattern.as_deref().unwrap_or("[^/]+"));
                    body.push_str("))?");
                    keys.push(PatternKey {
                        name: name.clone(),
                        optional: true,
                    });
                    continue;
                }

                body.push('/');
                push_pieces(&pieces, &mut body, &mut keys);
            }
        } else {
            // Unrooted template: the `*` catch-all (and nothing else in a
            // well-formed map). Matches the whole location including its
            // leading slash.
            let pieces = parse_segment(path);
            push_pieces(&pieces, &mut body, &mut keys);
        }

        if body.is_empty() {
            body.push('/');
        }
        if !options.strict && !body.ends_with('/') {
            body.push_str("/?");
        }

        let source = if options.sensitive {
            format!("^{body}$")
        } else {
            format!("(?i)^{body}$")
        };
        let regex = Regex::new(&source).map_err(|err| RouterError::Pattern {
            path: path.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self { regex, keys })
    }

    /// The declared parameter keys, in declaration order.
    pub fn keys(&self) -> &[PatternKey] {
        &self.keys
    }

    /// Tests the pattern against a path; on a match, returns the mapping
    /// from parameter name to percent-decoded matched substring. Optional
    /// parameters that did not participate are absent from the map.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let mut params = HashMap::new();
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.insert(key.name.clone(), decode_param(m.as_str()));
            }
        }
        Some(params)
    }
}

/// Synthesizes a concrete path from a template and a params map, the reverse
/// of [`CompiledPattern::captures`]. Used for name-based navigation and for
/// re-targeting alias records.
///
/// A missing required parameter is an error; a missing optional parameter
/// drops its segment.
pub fn fill_params(
    path: &str,
    params: &HashMap<String, String>,
) -> Result<String, RouterError> {
    let mut out = String::new();
    let mut wildcards = 0usize;

    let missing = |param: &str| RouterError::MissingParam {
        path: path.to_string(),
        param: param.to_string(),
    };

    let mut fill_pieces = |pieces: &[Piece], out: &mut String| -> Result<(), RouterError> {
        for piece in pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Param { name, optional, .. } => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None if *optional => {}
                    None => return Err(missing(name)),
                },
                Piece::Wildcard => {
                    let key = wildcard_key(wildcards);
                    wildcards += 1;
                    let value = params.get(&key).ok_or_else(|| missing(&key))?;
                    out.push_str(value);
                }
            }
        }
        Ok(())
    };

    if let Some(rest) = path.strip_prefix('/') {
        for segment in rest.split('/') {
            if segment.is_empty() {
                out.push('/');
                continue;
            }
            let pieces = parse_segment(segment);
            if let [Piece::Param {
                name,
                optional: true,
                ..
            }] = pieces.as_slice()
            {
                if let Some(value) = params.get(name) {
                    out.push('/');
                    out.push_str(value);
                }
                continue;
            }
            out.push('/');
            fill_pieces(&pieces, &mut out)?;
        }
    } else {
        fill_pieces(&parse_segment(path), &mut out)?;
    }

    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}
