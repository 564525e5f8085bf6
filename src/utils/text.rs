//! Text classification and whitespace helpers shared by the extractors,
//! the dictionary and the preview renderer.

use regex::Regex;

/// No-break space
pub const NBSP: char = '\u{a0}';

/// Compiles a pattern that is part of the source code
///
/// Only for literals known to be valid; user-supplied patterns go through
/// `Regex::new` and report `PatchError::InvalidPattern`.
pub fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| unreachable!("invalid built-in pattern {pattern}: {e}"))
}

/// True when `text` contains at least one letter in any script
pub fn has_letter(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// True for a no-break space or two or more consecutive whitespace characters
pub fn has_spacing_run(text: &str) -> bool {
    let mut previous_was_space = false;
    for c in text.chars() {
        if c == NBSP {
            return true;
        }
        if c.is_whitespace() {
            if previous_was_space {
                return true;
            }
            previous_was_space = true;
        } else {
            previous_was_space = false;
        }
    }
    false
}

/// Letters, digits and `_` form words for boundary checks
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Collapses every whitespace run to one space and trims both ends
///
/// ```rust
/// use textpatch::utils::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Hello \n\t World  "), "Hello World");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into leading whitespace, body and trailing whitespace
pub fn split_outer_whitespace(text: &str) -> (&str, &str, &str) {
    let body_start = text.len() - text.trim_start().len();
    let body_end = text.trim_end().len().max(body_start);

    (
        &text[..body_start],
        &text[body_start..body_end],
        &text[body_end..],
    )
}

/// Replaces no-break spaces and literal `&nbsp;` entities with plain spaces
pub fn normalize_nbsp(text: &str) -> String {
    text.replace("&nbsp;", " ").replace(NBSP, " ")
}

/// Lowercased letters of `text`, everything else dropped
pub fn letters_only(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Uppercases the first character of `text`
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Checks that the match `start..end` in `haystack` is not glued to a word character
pub fn is_bounded_match(haystack: &str, start: usize, end: usize) -> bool {
    let before_ok = haystack[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_word_char(c));
    let after_ok = haystack[end..]
        .chars()
        .next()
        .map_or(true, |c| !is_word_char(c));

    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_letter_any_script() {
        assert!(has_letter("12 café"));
        assert!(has_letter("日本"));
        assert!(!has_letter("12 - 34 !"));
    }

    #[test]
    fn test_has_spacing_run() {
        assert!(has_spacing_run("a  b"));
        assert!(has_spacing_run("\u{a0}"));
        assert!(!has_spacing_run("a b c"));
    }

    #[test]
    fn test_split_outer_whitespace() {
        assert_eq!(split_outer_whitespace("\n  Hi there "), ("\n  ", "Hi there", " "));
        assert_eq!(split_outer_whitespace("   "), ("   ", "", ""));
        assert_eq!(split_outer_whitespace("x"), ("", "x", ""));
    }

    #[test]
    fn test_normalize_nbsp() {
        assert_eq!(normalize_nbsp("a&nbsp;b\u{a0}c"), "a b c");
    }

    #[test]
    fn test_letters_only() {
        assert_eq!(letters_only("Hello, World! 42"), "helloworld");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("certo"), "Certo");
        assert_eq!(capitalize_first("état"), "État");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_is_bounded_match() {
        let text = "ok okay _ok ok";
        assert!(is_bounded_match(text, 0, 2));
        assert!(!is_bounded_match(text, 3, 5));
        assert!(!is_bounded_match(text, 9, 11));
        assert!(is_bounded_match(text, 12, 14));
    }
}
