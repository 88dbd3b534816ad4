//! Free-text input sanitization.
//!
//! This is pattern stripping, not HTML parsing: tag brackets are dropped
//! and inner text is kept.

use regex::Regex;
use std::sync::LazyLock;

use crate::limits::MAX_SEARCH_QUERY_LEN;

static ANGLE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>]").expect("angle bracket pattern"));

static SCRIPT_PROTOCOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)javascript:").expect("script protocol pattern"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)on[a-z0-9_]+=").expect("event handler pattern"));

static SEARCH_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("search charset pattern"));

/// Sanitize user input to prevent XSS.
///
/// Removes `<`/`>`, then `javascript:`, then `on<word>=`, each in a single
/// left-to-right pass, and trims. Case folding is ASCII only. Fragments that
/// join up once a match is removed are left in place:
/// `javajavascript:script:x` becomes `javascript:x`.
pub fn sanitize_input(input: &str) -> String {
    let text = ANGLE_BRACKETS.replace_all(input, "");
    let text = SCRIPT_PROTOCOL.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    text.trim().to_string()
}

/// Sanitize a search box query.
///
/// Applies [`sanitize_input`], keeps the first 100 characters, then drops
/// everything except word characters, whitespace and hyphens.
pub fn sanitize_search_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let base = sanitize_input(query);
    let truncated: String = base.chars().take(MAX_SEARCH_QUERY_LEN).collect();
    SEARCH_DISALLOWED.replace_all(&truncated, "").into_owned()
}
