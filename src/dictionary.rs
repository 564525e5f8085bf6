//! # User dictionary
//!
//! Literal and regular-expression substitution rules applied to unit values
//! independently of machine translation.
//!
//! Records are exchanged as a JSON array of
//! `{original, translated, attrName?, regex?}` objects. The legacy flat map of
//! original to translated strings is still accepted on import.
//!
//! Rules are compiled once into a `CompiledDictionary` and applied longest
//! original first:
//! - literal rules match case-insensitively, treat any whitespace run as one
//!   space, refuse matches glued to a letter, digit or `_`, and uppercase the
//!   replacement's first character when the matched text starts uppercase
//! - regex rules replace every case-insensitive match
//! - rules carrying an `attrName` only apply when that attribute shows up in
//!   the document text

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{PatchError, PatchResult};
use crate::utils::{capitalize_first, collapse_whitespace, is_bounded_match, NBSP};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictEntry {
    pub original: String,
    #[serde(default)]
    pub translated: String,
    /// Only apply when this attribute name appears in the document
    #[serde(default)]
    pub attr_name: Option<String>,
    /// `original` is a regular expression
    #[serde(default)]
    pub regex: bool,
    /// Literal rules match case-insensitively unless this is `Some(true)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl DictEntry {
    pub fn literal(original: &str, translated: &str) -> Self {
        DictEntry {
            original: original.to_string(),
            translated: translated.to_string(),
            attr_name: None,
            regex: false,
            case_sensitive: None,
        }
    }

    pub fn pattern(pattern: &str, translated: &str) -> Self {
        DictEntry {
            regex: true,
            ..DictEntry::literal(pattern, translated)
        }
    }

    pub fn with_attr_name(mut self, attr_name: &str) -> Self {
        self.attr_name = Some(attr_name.to_string());
        self
    }
}

/// User-maintained substitution rules, at most one per `original`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDictionary {
    entries: Vec<DictEntry>,
}

impl UserDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    pub fn get(&self, original: &str) -> Option<&DictEntry> {
        self.entries.iter().find(|e| e.original == original)
    }

    /// Adds an entry, replacing any entry with the same `original`
    pub fn insert(&mut self, entry: DictEntry) {
        match self.entries.iter_mut().find(|e| e.original == entry.original) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, original: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.original != original);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts every entry of `other`; returns how many were merged
    pub fn merge(&mut self, other: UserDictionary) -> usize {
        let count = other.entries.len();
        for entry in other.entries {
            self.insert(entry);
        }
        count
    }

    /// Parses either the record array or a legacy object
    ///
    /// The legacy object maps an original either to its translation or to a
    /// record (the shape kept in local storage by older versions).
    pub fn from_json_str(json: &str) -> PatchResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let mut dictionary = UserDictionary::new();

        match value {
            Value::Array(_) => {
                let entries: Vec<DictEntry> = serde_json::from_value(value)?;
                for entry in entries {
                    if !entry.original.is_empty() {
                        dictionary.insert(entry);
                    }
                }
            }
            Value::Object(members) => {
                for (key, member) in members {
                    match member {
                        Value::String(translated) => {
                            dictionary.insert(DictEntry::literal(&key, &translated))
                        }
                        Value::Object(_) => {
                            let mut entry: DictEntry = serde_json::from_value(member)?;
                            if entry.original.is_empty() {
                                entry.original = key;
                            }
                            dictionary.insert(entry);
                        }
                        other => tracing::warn!(
                            "Ignoring dictionary entry \"{}\" with unsupported value {}",
                            key,
                            other
                        ),
                    }
                }
            }
            _ => {
                return Err(PatchError::Config(
                    "dictionary must be a JSON array or object".to_string(),
                ))
            }
        }

        Ok(dictionary)
    }

    /// Pretty-printed record array
    pub fn to_json_string(&self) -> PatchResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn load(path: &Path) -> PatchResult<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> PatchResult<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Compiles the rules; entries with invalid patterns are reported and left out
    pub fn compile(&self) -> (CompiledDictionary, Vec<PatchError>) {
        let mut sorted: Vec<&DictEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.original.chars().count().cmp(&a.original.chars().count()));

        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for entry in sorted {
            match CompiledRule::compile(entry) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!("Skipping dictionary entry: {}", error);
                    errors.push(error);
                }
            }
        }

        (CompiledDictionary { rules }, errors)
    }
}

#[derive(Debug)]
enum Matcher {
    Literal(Regex),
    Pattern(Regex),
}

#[derive(Debug)]
struct CompiledRule {
    matcher: Matcher,
    translated: String,
    attr_scope: Option<Regex>,
}

impl CompiledRule {
    /// `Ok(None)` for entries that can never apply (empty original or translation)
    fn compile(entry: &DictEntry) -> PatchResult<Option<Self>> {
        let invalid = |e: regex::Error| PatchError::InvalidPattern {
            pattern: entry.original.clone(),
            message: e.to_string(),
        };

        let matcher = if entry.regex {
            if entry.original.is_empty() {
                return Ok(None);
            }
            Matcher::Pattern(
                RegexBuilder::new(&entry.original)
                    .case_insensitive(true)
                    .build()
                    .map_err(invalid)?,
            )
        } else {
            let cleaned = collapse_whitespace(&entry.original.replace(NBSP, " "));
            if cleaned.is_empty() || entry.translated.is_empty() {
                return Ok(None);
            }
            let words: Vec<String> = cleaned.split(' ').map(regex::escape).collect();
            Matcher::Literal(
                RegexBuilder::new(&words.join(r"\s+"))
                    .case_insensitive(entry.case_sensitive != Some(true))
                    .build()
                    .map_err(invalid)?,
            )
        };

        let attr_scope = match entry.attr_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                RegexBuilder::new(&format!(r"{}\s*[=(]", regex::escape(name)))
                    .case_insensitive(true)
                    .build()
                    .map_err(invalid)?,
            ),
            _ => None,
        };

        Ok(Some(CompiledRule {
            matcher,
            translated: entry.translated.clone(),
            attr_scope,
        }))
    }

    fn apply(&self, text: &str) -> String {
        match &self.matcher {
            Matcher::Pattern(regex) => regex.replace_all(text, self.translated.as_str()).into_owned(),
            Matcher::Literal(regex) => replace_bounded(regex, text, &self.translated),
        }
    }
}

/// Replaces every match not glued to a word character, keeping initial capitals
fn replace_bounded(regex: &Regex, text: &str, translated: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut copied_until = 0;
    let mut search_from = 0;

    while search_from <= text.len() {
        let Some(found) = regex.find_at(text, search_from) else {
            break;
        };
        if found.start() == found.end() {
            break;
        }

        if is_bounded_match(text, found.start(), found.end()) {
            result.push_str(&text[copied_until..found.start()]);
            let starts_upper = found.as_str().chars().next().is_some_and(char::is_uppercase);
            if starts_upper {
                result.push_str(&capitalize_first(translated));
            } else {
                result.push_str(translated);
            }
            copied_until = found.end();
            search_from = found.end();
        } else {
            // Retry from the next character; a bounded match may overlap this one
            search_from = found.start()
                + found.as_str().chars().next().map_or(1, char::len_utf8);
        }
    }

    result.push_str(&text[copied_until..]);
    result
}

/// Dictionary rules ready to apply, longest original first
#[derive(Debug, Default)]
pub struct CompiledDictionary {
    rules: Vec<CompiledRule>,
}

impl CompiledDictionary {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule in turn to `text`
    ///
    /// `document_text` decides whether attribute-scoped rules are in play.
    pub fn apply(&self, text: &str, document_text: &str) -> String {
        let mut working = text.to_string();

        for rule in &self.rules {
            if let Some(scope) = &rule.attr_scope {
                if !scope.is_match(document_text) {
                    continue;
                }
            }
            working = rule.apply(&working);
        }

        working
    }
}
