//! Live substitution of edited values into raw content
//!
//! The preview never reinjects: it searches the raw document for each edited
//! unit's original text and swaps in the current value. Longer originals go
//! first so a short text cannot break up a longer one that contains it.

use regex::{NoExpand, Regex, RegexBuilder};

use crate::store::EditStore;
use crate::utils::{collapse_whitespace, is_word_char, NBSP};

/// One original to current pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub original: String,
    pub replacement: String,
}

/// Substitutions for every edited unit, longest original first
///
/// Equal lengths are ordered by the longer replacement first.
pub fn substitutions_from_store(store: &EditStore) -> Vec<Substitution> {
    let mut substitutions: Vec<Substitution> = store
        .iter()
        .filter(|unit| unit.is_edited())
        .map(|unit| Substitution {
            original: unit.original.clone(),
            replacement: unit.current.clone(),
        })
        .collect();

    substitutions.sort_by(|a, b| {
        b.original
            .chars()
            .count()
            .cmp(&a.original.chars().count())
            .then_with(|| b.replacement.chars().count().cmp(&a.replacement.chars().count()))
    });
    substitutions
}

/// Applies `substitutions` in order
pub fn apply_substitutions(content: &str, substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .fold(content.to_string(), |content, substitution| {
            replace_smart(&content, &substitution.original, &substitution.replacement)
        })
}

/// Case-insensitive replacement of `original`, guarded by word boundaries
///
/// Spaces in `original` match any run of spaces and no-break spaces. When no
/// guarded match exists, unguarded matches are replaced instead.
///
/// ```
/// use textpatch::preview::substitute::replace_smart;
///
/// assert_eq!(replace_smart("<b>Save</b> saved", "save", "Salvar"), "<b>Salvar</b> saved");
/// ```
pub fn replace_smart(content: &str, original: &str, replacement: &str) -> String {
    let normalized = collapse_whitespace(&original.replace(NBSP, " "));
    if normalized.is_empty() {
        return content.to_string();
    }

    let words: Vec<String> = normalized.split(' ').map(regex::escape).collect();
    let pattern = words.join("[ \u{a0}]+");
    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex,
        Err(e) => {
            tracing::debug!("Cannot build preview pattern for {:?}: {}", original, e);
            return content.to_string();
        }
    };

    match replace_guarded(&regex, content, replacement) {
        Some(replaced) => replaced,
        None => regex.replace_all(content, NoExpand(replacement)).into_owned(),
    }
}

fn is_glue(c: char) -> bool {
    is_word_char(c) || c == '-'
}

/// `None` when no match is free of word characters on both sides
fn replace_guarded(regex: &Regex, content: &str, replacement: &str) -> Option<String> {
    let mut result = String::with_capacity(content.len());
    let mut copied_until = 0;
    let mut search_from = 0;
    let mut replaced_any = false;

    while search_from <= content.len() {
        let Some(found) = regex.find_at(content, search_from) else {
            break;
        };

        let before = content[..found.start()].chars().next_back();
        let after = content[found.end()..].chars().next();
        let guarded = !before.is_some_and(is_glue) && !after.is_some_and(is_glue);

        if guarded {
            result.push_str(&content[copied_until..found.start()]);
            result.push_str(replacement);
            copied_until = found.end();
            search_from = found.end();
            replaced_any = true;
        } else {
            search_from = found.start()
                + found.as_str().chars().next().map_or(1, char::len_utf8);
        }
    }

    if !replaced_any {
        return None;
    }
    result.push_str(&content[copied_until..]);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Document, DocumentFormat};
    use crate::extraction::extract;

    #[test]
    fn test_guarded_replacement_skips_glued_text() {
        assert_eq!(
            replace_smart("ok, okay, non-ok, OK", "ok", "certo"),
            "certo, okay, non-ok, certo"
        );
    }

    #[test]
    fn test_flexible_spaces() {
        assert_eq!(
            replace_smart("<p>Hello\u{a0} world</p>", "Hello world", "Olá mundo"),
            "<p>Olá mundo</p>"
        );
    }

    #[test]
    fn test_unguarded_fallback() {
        assert_eq!(replace_smart("prefixHello", "Hello", "Olá"), "prefixOlá");
    }

    #[test]
    fn test_replacement_is_literal() {
        assert_eq!(replace_smart("Price", "Price", "$1 each"), "$1 each");
    }

    #[test]
    fn test_longest_original_first() {
        let document = Document::parse(
            "t.html",
            DocumentFormat::Html,
            "<p>Save</p><p>Save all</p>".to_string(),
        )
        .unwrap();
        let mut store = EditStore::from_units(document.generation(), extract(&document).unwrap());
        let ids = store.ids();
        store.set_value(&ids[0], "Salvar");
        store.set_value(&ids[1], "Salvar tudo");

        let substitutions = substitutions_from_store(&store);
        assert_eq!(substitutions[0].original, "Save all");

        assert_eq!(
            apply_substitutions(document.raw(), &substitutions),
            "<p>Salvar</p><p>Salvar tudo</p>"
        );
    }

    #[test]
    fn test_ties_broken_by_replacement_length() {
        let document = Document::parse(
            "t.json",
            DocumentFormat::Json,
            r#"{"a": "one", "b": "two"}"#.to_string(),
        )
        .unwrap();
        let mut store = EditStore::from_units(document.generation(), extract(&document).unwrap());
        let ids = store.ids();
        store.set_value(&ids[0], "um");
        store.set_value(&ids[1], "dois");

        let substitutions = substitutions_from_store(&store);
        assert_eq!(substitutions[0].replacement, "dois");
    }
}
