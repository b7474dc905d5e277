// Component splitting: scheme://host, path, query
//
// Best-effort only. No percent-decoding, no validation; malformed input
// degrades to "everything is path" rather than failing.

use serde::Serialize;
use tracing::debug;

/// Raw substrings of the input, split but otherwise untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlComponents {
    /// `scheme://host`, or empty for local inputs.
    pub base: String,
    /// Path including its leading `/` when one was present.
    pub path: String,
    /// Text after the first `?`, if any.
    pub query: Option<String>,
}

/// True if `prefix` is a valid scheme name: a letter followed by letters,
/// digits, `+`, `.` or `-`.
fn is_scheme(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '.' | '-'))
}

/// Split a raw string into its components. Never fails.
pub fn split_components(input: &str) -> UrlComponents {
    let components = match input.find("://") {
        Some(idx) if is_scheme(&input[..idx]) => split_with_scheme(input, idx),
        _ => split_local(input),
    };
    debug!(
        base = %components.base,
        path = %components.path,
        query = components.query.as_deref().unwrap_or(""),
        "split components"
    );
    components
}

fn split_with_scheme(input: &str, scheme_end: usize) -> UrlComponents {
    let prefix_end = scheme_end + "://".len();
    let rest = &input[prefix_end..];

    let slash = rest.find('/');
    let question = rest.find('?');

    match (slash, question) {
        // Host only.
        (None, None) => UrlComponents {
            base: input.to_string(),
            path: String::new(),
            query: None,
        },
        // Host + query, no path (also covers `?` before the first `/`).
        (slash, Some(q)) if slash.map_or(true, |s| q < s) => UrlComponents {
            base: input[..prefix_end + q].to_string(),
            path: String::new(),
            query: Some(rest[q + 1..].to_string()),
        },
        // Host + path, optionally + query.
        (Some(s), question) => {
            let after_host = &rest[s..];
            let (path, query) = match question {
                Some(q) => (&rest[s..q], Some(rest[q + 1..].to_string())),
                None => (after_host, None),
            };
            UrlComponents {
                base: input[..prefix_end + s].to_string(),
                path: path.to_string(),
                query,
            }
        }
        (None, Some(_)) => unreachable!("covered by the query arm"),
    }
}

fn split_local(input: &str) -> UrlComponents {
    match input.split_once('?') {
        Some((path, query)) => UrlComponents {
            base: String::new(),
            path: path.to_string(),
            query: Some(query.to_string()),
        },
        None => UrlComponents {
            base: String::new(),
            path: input.to_string(),
            query: None,
        },
    }
}
