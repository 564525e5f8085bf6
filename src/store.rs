//! # Edit store
//!
//! The extraction units of one loaded document, in extraction order, with the
//! mutations a user (or an automated pass) can make to them. Every mutation
//! honours `locked` and reports an `EditOutcome` instead of failing.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::constants::{RESERVED_CODE_TERMS, RESERVED_MIXED_TERMS};
use crate::core::Generation;
use crate::dictionary::CompiledDictionary;
use crate::extraction::{ExtractionUnit, UnitId};
use crate::parsers::json::JsonPath;
use crate::utils::static_regex;

/// Result of a single-unit mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The unit changed
    Applied,
    /// The operation ran but left the value as it was
    Unchanged,
    /// The unit is locked; nothing was touched
    Locked,
    /// No unit has this id
    Missing,
}

/// Ordered, id-indexed collection of the units of one document load
#[derive(Clone, Debug)]
pub struct EditStore {
    generation: Generation,
    units: Vec<ExtractionUnit>,
    index: HashMap<UnitId, usize>,
}

impl EditStore {
    pub fn new(generation: Generation) -> Self {
        EditStore {
            generation,
            units: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_units(generation: Generation, units: Vec<ExtractionUnit>) -> Self {
        let mut store = EditStore::new(generation);
        store.extend(units);
        store
    }

    /// Appends a unit; a unit whose id is already present is dropped
    pub fn push(&mut self, unit: ExtractionUnit) -> bool {
        if self.index.contains_key(&unit.id) {
            tracing::warn!("Dropping unit with duplicate id {}", unit.id);
            return false;
        }
        self.index.insert(unit.id.clone(), self.units.len());
        self.units.push(unit);
        true
    }

    pub fn extend(&mut self, units: impl IntoIterator<Item = ExtractionUnit>) {
        for unit in units {
            self.push(unit);
        }
    }

    /// Load the units were extracted from
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[ExtractionUnit] {
        &self.units
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionUnit> {
        self.units.iter()
    }

    pub fn get(&self, id: &UnitId) -> Option<&ExtractionUnit> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    fn get_mut(&mut self, id: &UnitId) -> Option<&mut ExtractionUnit> {
        match self.index.get(id) {
            Some(&i) => self.units.get_mut(i),
            None => None,
        }
    }

    /// Ids of every unit, in order
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id.clone()).collect()
    }

    pub fn edited_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_edited()).count()
    }

    pub fn locked_count(&self) -> usize {
        self.units.iter().filter(|u| u.locked).count()
    }

    /// Replaces `current` unless the unit is locked
    pub fn set_value(&mut self, id: &UnitId, value: &str) -> EditOutcome {
        self.update(id, |_| Some(value.to_string()))
    }

    /// Runs `edit` on an unlocked unit and stores its result, if any
    fn update(
        &mut self,
        id: &UnitId,
        edit: impl FnOnce(&ExtractionUnit) -> Option<String>,
    ) -> EditOutcome {
        let Some(unit) = self.get_mut(id) else {
            return EditOutcome::Missing;
        };
        if unit.locked {
            return EditOutcome::Locked;
        }

        match edit(unit) {
            Some(value) if value != unit.current => {
                unit.current = value;
                EditOutcome::Applied
            }
            _ => EditOutcome::Unchanged,
        }
    }

    pub fn lock(&mut self, id: &UnitId) -> EditOutcome {
        self.set_locked(id, true)
    }

    pub fn unlock(&mut self, id: &UnitId) -> EditOutcome {
        self.set_locked(id, false)
    }

    fn set_locked(&mut self, id: &UnitId, locked: bool) -> EditOutcome {
        match self.get_mut(id) {
            Some(unit) if unit.locked == locked => EditOutcome::Unchanged,
            Some(unit) => {
                unit.locked = locked;
                EditOutcome::Applied
            }
            None => EditOutcome::Missing,
        }
    }

    pub fn is_locked(&self, id: &UnitId) -> bool {
        self.get(id).is_some_and(|u| u.locked)
    }

    /// Locks every unit, or unlocks every unit when all are already locked
    ///
    /// Returns the new state.
    pub fn toggle_all_locks(&mut self) -> bool {
        let lock = !self.units.iter().all(|u| u.locked);
        self.set_all_locked(lock);
        lock
    }

    pub fn set_all_locked(&mut self, locked: bool) {
        for unit in &mut self.units {
            unit.locked = locked;
        }
    }

    /// Resets `current` to `original` unless the unit is locked
    pub fn restore_original(&mut self, id: &UnitId) -> EditOutcome {
        self.update(id, |unit| Some(unit.original.clone()))
    }

    /// Runs the dictionary over one unit's `current`
    pub fn apply_dictionary(
        &mut self,
        id: &UnitId,
        dictionary: &CompiledDictionary,
        document_text: &str,
    ) -> EditOutcome {
        self.update(id, |unit| Some(dictionary.apply(&unit.current, document_text)))
    }

    /// Runs the dictionary over every unit; returns how many changed
    pub fn apply_dictionary_all(
        &mut self,
        dictionary: &CompiledDictionary,
        document_text: &str,
    ) -> usize {
        if dictionary.is_empty() {
            return 0;
        }

        self.ids()
            .iter()
            .filter(|id| self.apply_dictionary(id, dictionary, document_text) == EditOutcome::Applied)
            .count()
    }

    /// Locks units whose value is a code keyword or a known UI identifier
    ///
    /// Keywords only match an all-lowercase value; identifiers match ignoring
    /// case. Returns how many units were newly locked.
    pub fn lock_reserved_terms(&mut self) -> usize {
        let mut count = 0;

        for unit in &mut self.units {
            let value = unit.current.trim();
            let is_lower_token = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            let code_term = is_lower_token && RESERVED_CODE_TERMS.contains(&value);
            let mixed_term = RESERVED_MIXED_TERMS
                .iter()
                .any(|term| term.eq_ignore_ascii_case(value));

            if (code_term || mixed_term) && !unit.locked {
                unit.locked = true;
                count += 1;
            }
        }

        tracing::info!("Locked {} units holding reserved terms", count);
        count
    }

    /// Units whose `current` contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<&ExtractionUnit> {
        let needle = term.trim().to_lowercase();
        self.units
            .iter()
            .filter(|u| u.current.to_lowercase().contains(&needle))
            .collect()
    }

    /// Replaces leaked whitespace placeholders (`__WS3__`, `_space_`, ...) by a space
    ///
    /// Returns how many units changed.
    pub fn fix_space_tokens(&mut self) -> usize {
        static SPACE_TOKEN: OnceLock<Regex> = OnceLock::new();
        let token = SPACE_TOKEN.get_or_init(|| {
            static_regex(r"(?i)[_\s]*__?\s*(?:ws|space|espace|espaco)[-_]?\s*\d*\s*__?\s*[_\s]*")
        });

        self.ids()
            .iter()
            .filter(|id| {
                self.update(id, |unit| Some(token.replace_all(&unit.current, " ").into_owned()))
                    == EditOutcome::Applied
            })
            .count()
    }

    /// Rows of a strings export, one per distinct trimmed original
    pub fn export_strings(&self) -> Vec<StringRecord> {
        let mut seen = HashSet::new();

        self.units
            .iter()
            .enumerate()
            .filter(|(_, unit)| seen.insert(unit.original.trim().to_string()))
            .map(|(position, unit)| StringRecord {
                original: unit.original.clone(),
                translated: unit.current.clone(),
                kind: unit.kind.export_name().to_string(),
                index: match &unit.id {
                    UnitId::Text(i) | UnitId::Attribute(i) => *i,
                    UnitId::Json(_) => position,
                },
                attr_name: unit.attr_name().map(str::to_string),
                json_path: unit.json_path().cloned(),
            })
            .collect()
    }

    /// Applies the `translated` values of a strings export
    ///
    /// A row targets every unit sharing its trimmed original. Its `index` and
    /// `jsonPath` are not trusted, since the export may come from another
    /// version of the document. Returns how many units changed.
    pub fn import_strings(&mut self, records: &[StringRecord]) -> usize {
        let mut changed = 0;

        for record in records {
            let wanted = record.original.trim();
            let targets: Vec<UnitId> = self
                .units
                .iter()
                .filter(|u| u.original.trim() == wanted)
                .map(|u| u.id.clone())
                .collect();

            for id in targets {
                if self.set_value(&id, &record.translated) == EditOutcome::Applied {
                    changed += 1;
                }
            }
        }

        changed
    }
}

/// One row of `strings_export.json`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringRecord {
    pub original: String,
    pub translated: String,
    /// `text`, `attr` or `json`
    #[serde(rename = "type")]
    pub kind: String,
    pub index: usize,
    #[serde(default)]
    pub attr_name: Option<String>,
    #[serde(default)]
    pub json_path: Option<JsonPath>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DictEntry, UserDictionary};
    use crate::extraction::{UnitContext, UnitKind};

    fn text_unit(index: usize, original: &str) -> ExtractionUnit {
        ExtractionUnit::new(
            UnitId::Text(index),
            UnitKind::TextNode,
            original.to_string(),
            UnitContext::Json,
        )
    }

    fn store(originals: &[&str]) -> EditStore {
        EditStore::from_units(
            Generation::next(),
            originals
                .iter()
                .enumerate()
                .map(|(i, o)| text_unit(i, o))
                .collect(),
        )
    }

    #[test]
    fn test_set_value_and_restore() {
        let mut store = store(&["Hello"]);
        let id = UnitId::Text(0);

        assert_eq!(store.set_value(&id, "Olá"), EditOutcome::Applied);
        assert_eq!(store.set_value(&id, "Olá"), EditOutcome::Unchanged);
        assert_eq!(store.get(&id).unwrap().current, "Olá");
        assert_eq!(store.restore_original(&id), EditOutcome::Applied);
        assert_eq!(store.get(&id).unwrap().current, "Hello");
        assert_eq!(store.set_value(&UnitId::Text(9), "x"), EditOutcome::Missing);
    }

    #[test]
    fn test_locked_units_ignore_mutations() {
        let mut store = store(&["Ok, done"]);
        let id = UnitId::Text(0);
        let mut dictionary = UserDictionary::new();
        dictionary.insert(DictEntry::literal("ok", "certo"));
        let (compiled, _) = dictionary.compile();

        assert_eq!(store.lock(&id), EditOutcome::Applied);
        assert_eq!(store.set_value(&id, "x"), EditOutcome::Locked);
        assert_eq!(store.apply_dictionary(&id, &compiled, ""), EditOutcome::Locked);
        assert_eq!(store.get(&id).unwrap().current, "Ok, done");

        assert_eq!(store.unlock(&id), EditOutcome::Applied);
        assert_eq!(store.apply_dictionary(&id, &compiled, ""), EditOutcome::Applied);
        assert_eq!(store.get(&id).unwrap().current, "Certo, done");
        assert_eq!(store.apply_dictionary(&id, &compiled, ""), EditOutcome::Unchanged);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut store = store(&["a"]);
        assert!(!store.push(text_unit(0, "b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_toggle_all_locks() {
        let mut store = store(&["a", "b"]);
        store.lock(&UnitId::Text(0));

        assert!(store.toggle_all_locks());
        assert_eq!(store.locked_count(), 2);
        assert!(!store.toggle_all_locks());
        assert_eq!(store.locked_count(), 0);
    }

    #[test]
    fn test_lock_reserved_terms() {
        let mut store = store(&["return", "Return", "Primary", "Save changes", "width"]);

        assert_eq!(store.lock_reserved_terms(), 3);
        assert!(store.is_locked(&UnitId::Text(0)));
        assert!(!store.is_locked(&UnitId::Text(1)));
        assert!(store.is_locked(&UnitId::Text(2)));
        assert!(!store.is_locked(&UnitId::Text(3)));
        assert!(store.is_locked(&UnitId::Text(4)));
    }

    #[test]
    fn test_search_ignores_case() {
        let store = store(&["Hello World", "Goodbye", "world peace"]);
        let found: Vec<&str> = store
            .search("WORLD")
            .iter()
            .map(|u| u.current.as_str())
            .collect();

        assert_eq!(found, vec!["Hello World", "world peace"]);
    }

    #[test]
    fn test_fix_space_tokens() {
        let mut store = store(&["a", "b", "c"]);
        store.set_value(&UnitId::Text(0), "Olá__WS0__mundo");
        store.set_value(&UnitId::Text(1), "Olá _space_ mundo");

        assert_eq!(store.fix_space_tokens(), 2);
        assert_eq!(store.get(&UnitId::Text(0)).unwrap().current, "Olá mundo");
        assert_eq!(store.get(&UnitId::Text(1)).unwrap().current, "Olá mundo");
        assert_eq!(store.get(&UnitId::Text(2)).unwrap().current, "c");
    }

    #[test]
    fn test_export_strings_deduplicates_by_trimmed_original() {
        let mut store = store(&["Hello", "World", "Hello "]);
        store.set_value(&UnitId::Text(1), "Mundo");

        let rows = store.export_strings();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].translated, "Mundo");
        assert_eq!(rows[1].kind, "text");
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_import_strings_applies_to_duplicates() {
        let mut store = store(&["Hello", "World", "Hello"]);
        let rows = vec![StringRecord {
            original: "Hello".to_string(),
            translated: "Olá".to_string(),
            kind: "text".to_string(),
            index: 0,
            attr_name: None,
            json_path: None,
        }];

        assert_eq!(store.import_strings(&rows), 2);
        assert_eq!(store.get(&UnitId::Text(2)).unwrap().current, "Olá");
    }

    #[test]
    fn test_import_strings_ignores_ids_of_other_originals() {
        let mut store = store(&["Hello", "World"]);
        let rows = vec![StringRecord {
            original: "Goodbye".to_string(),
            translated: "Adeus".to_string(),
            kind: "text".to_string(),
            index: 1,
            attr_name: None,
            json_path: None,
        }];

        assert_eq!(store.import_strings(&rows), 0);
        assert_eq!(store.get(&UnitId::Text(1)).unwrap().current, "World");
    }
}
