//! Inline event-handler attributes
//!
//! Handlers such as `onclick="alert('Saved!')"` often carry user-visible
//! strings as literal call arguments. This module recognizes the handler
//! attributes worth scanning and pulls those literals out.

use std::sync::OnceLock;

use regex::Regex;

use crate::utils::{has_letter, has_spacing_run, static_regex};

/// Event-handler attributes whose string arguments are offered for translation
const TRANSLATABLE_HANDLER_ATTRS: &[&str] = &[
    "onclick",
    "onmouseover",
    "onchange",
    "oninput",
    "onfocus",
    "onblur",
];

/// Checks whether an attribute is one of the scanned event handlers
///
/// Comparison is case-insensitive, like HTML attribute names.
///
/// ```rust
/// use textpatch::parsers::js::attr_is_translatable_handler;
///
/// assert!(attr_is_translatable_handler("onclick"));
/// assert!(attr_is_translatable_handler("OnBlur"));
/// assert!(!attr_is_translatable_handler("onload"));
/// assert!(!attr_is_translatable_handler("title"));
/// ```
pub fn attr_is_translatable_handler(attr_name: &str) -> bool {
    TRANSLATABLE_HANDLER_ATTRS
        .iter()
        .any(|a| attr_name.eq_ignore_ascii_case(a))
}

/// A string literal passed as the sole argument of a call in handler code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerLiteral {
    /// Literal text exactly as written between the quotes (outer spaces trimmed)
    pub raw: String,
    /// Quote character delimiting the literal
    pub quote: char,
    /// Byte offset of `raw` in the handler code
    pub start: usize,
}

fn call_literal_regex() -> &'static Regex {
    static CALL_LITERAL: OnceLock<Regex> = OnceLock::new();
    CALL_LITERAL.get_or_init(|| {
        static_regex(r#"\(\s*'\s*([^']*?)\s*'\s*\)|\(\s*"\s*([^"]*?)\s*"\s*\)"#)
    })
}

/// Finds `('…')` / `("…")` literals in handler code that look like human text
///
/// A literal qualifies when it contains a letter, a no-break space (literal or
/// `&nbsp;`), or a run of two or more whitespace characters.
pub fn extract_handler_literals(handler_code: &str) -> Vec<HandlerLiteral> {
    call_literal_regex()
        .captures_iter(handler_code)
        .filter_map(|captures| {
            let (matched, quote) = match (captures.get(1), captures.get(2)) {
                (Some(single), _) => (single, '\''),
                (None, Some(double)) => (double, '"'),
                _ => return None,
            };
            let raw = matched.as_str();
            if raw.is_empty() {
                return None;
            }
            let display = raw.replace("&nbsp;", "\u{a0}");
            if has_letter(&display) || has_spacing_run(&display) {
                Some(HandlerLiteral {
                    raw: raw.to_string(),
                    quote,
                    start: matched.start(),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Escapes `quote` and backslashes so `value` stays inside its literal
pub fn escape_for_literal(value: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == quote || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
