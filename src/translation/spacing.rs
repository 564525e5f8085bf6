//! Whitespace placeholders
//!
//! Engines tend to collapse or drop runs of spaces and no-break spaces, so
//! every run is swapped for a `__WS<n>__` token before a request and put back
//! afterwards.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::utils::static_regex;

/// Original whitespace runs, indexed by token number
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpaceMap(Vec<String>);

impl SpaceMap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Replaces each run of spaces or no-break spaces with a numbered token
///
/// ```
/// use textpatch::translation::spacing::preserve_spaces;
///
/// let (tokenized, map) = preserve_spaces("Hello  world");
/// assert_eq!(tokenized, "Hello__WS0__world");
/// assert_eq!(map.len(), 1);
/// ```
pub fn preserve_spaces(text: &str) -> (String, SpaceMap) {
    static RUN: OnceLock<Regex> = OnceLock::new();
    let run = RUN.get_or_init(|| static_regex("(?: |\u{a0})+"));

    let mut map = Vec::new();
    let tokenized = run.replace_all(text, |caps: &Captures| {
        let token = format!("__WS{}__", map.len());
        map.push(caps[0].to_string());
        token
    });

    (tokenized.into_owned(), SpaceMap(map))
}

/// Puts the original runs back; a token with no entry in `map` disappears
pub fn restore_spaces(text: &str, map: &SpaceMap) -> String {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| static_regex(r"__WS(\d+)__"));

    token
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| map.0.get(n))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Punctuation spacing cleanup applied to engine output
///
/// Collapses whitespace, removes spaces before `.,!?;:` and after `¿¡`,
/// and drops Portuguese articles the engines glue onto identifiers
/// (`a Button` becomes `Button`).
pub fn tidy_punctuation(text: &str) -> String {
    static MULTI_SPACE: OnceLock<Regex> = OnceLock::new();
    static SPACE_BEFORE_PUNCT: OnceLock<Regex> = OnceLock::new();
    static SPACE_AFTER_OPENER: OnceLock<Regex> = OnceLock::new();
    static ARTICLE_IDENTIFIER: OnceLock<Regex> = OnceLock::new();

    let multi_space = MULTI_SPACE.get_or_init(|| static_regex(r"\s{2,}"));
    let before_punct = SPACE_BEFORE_PUNCT.get_or_init(|| static_regex(r"\s+([.,!?;:])"));
    let after_opener = SPACE_AFTER_OPENER.get_or_init(|| static_regex(r"([¿¡])\s+"));
    let article = ARTICLE_IDENTIFIER.get_or_init(|| {
        static_regex(r"\b(?:a|à|ao|aos|as)\s+([A-Z][a-zA-Z0-9_]+)(?:\s*\b(?:a|à|ao|aos|as)\b)?")
    });

    let text = multi_space.replace_all(text, " ");
    let text = before_punct.replace_all(&text, "$1");
    let text = after_opener.replace_all(&text, "$1");
    let text = article.replace_all(&text, "$1");

    text.trim().to_string()
}
