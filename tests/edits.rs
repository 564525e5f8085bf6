//! Dictionary application, locking and the strings export over real documents

use std::fs;

use textpatch::dictionary::{DictEntry, UserDictionary};
use textpatch::store::{EditOutcome, StringRecord};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{id_of, load, write_fixture, PAGE_HTML, STRINGS_XML};

fn ok_dictionary() -> UserDictionary {
    let mut dictionary = UserDictionary::new();
    dictionary.insert(DictEntry::literal("ok", "certo"));
    dictionary
}

#[test]
fn test_dictionary_keeps_capitalization_and_word_boundaries() {
    let mut workspace = load("list.html", "<ul><li>Ok, done</li><li>okay</li></ul>");

    let (changed, errors) = workspace.apply_dictionary(&ok_dictionary());

    assert_eq!(changed, 1);
    assert!(errors.is_empty());
    let values: Vec<&str> = workspace.store().iter().map(|u| u.current.as_str()).collect();
    assert_eq!(values, vec!["Certo, done", "okay"]);
}

#[test]
fn test_dictionary_application_is_idempotent() {
    let mut workspace = load("list.html", "<ul><li>Ok, done</li><li>ok ok</li></ul>");

    workspace.apply_dictionary(&ok_dictionary());
    let first: Vec<String> = workspace.store().iter().map(|u| u.current.clone()).collect();
    let (changed, _) = workspace.apply_dictionary(&ok_dictionary());
    let second: Vec<String> = workspace.store().iter().map(|u| u.current.clone()).collect();

    assert_eq!(changed, 0);
    assert_eq!(first, second);
}

#[test]
fn test_locked_units_ignore_dictionary_until_unlocked() {
    let mut workspace = load("one.html", "<p>Ok, done</p>");
    let id = id_of(workspace.store(), "Ok, done");

    assert_eq!(workspace.store_mut().lock(&id), EditOutcome::Applied);
    let (changed, _) = workspace.apply_dictionary(&ok_dictionary());
    assert_eq!(changed, 0);
    assert_eq!(workspace.store_mut().set_value(&id, "manual"), EditOutcome::Locked);
    assert_eq!(workspace.store().get(&id).unwrap().current, "Ok, done");

    workspace.store_mut().unlock(&id);
    let (changed, _) = workspace.apply_dictionary(&ok_dictionary());
    assert_eq!(changed, 1);
    assert_eq!(workspace.store().get(&id).unwrap().current, "Certo, done");
}

#[test]
fn test_invalid_pattern_skips_only_that_entry() {
    let mut workspace = load("one.html", "<p>Ok, done</p>");
    let mut dictionary = ok_dictionary();
    dictionary.insert(DictEntry::pattern("[unclosed", "x"));

    let (changed, errors) = workspace.apply_dictionary(&dictionary);

    assert_eq!(changed, 1);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_attribute_scoped_entry_needs_the_attribute_in_the_document() {
    let mut dictionary = UserDictionary::new();
    dictionary.insert(DictEntry::literal("Save", "Salvar").with_attr_name("onclick"));

    let mut with_handler = load("page.html", PAGE_HTML);
    with_handler.apply_dictionary(&dictionary);
    let id = id_of(with_handler.store(), "Save");
    assert_eq!(with_handler.store().get(&id).unwrap().current, "Salvar");

    let mut without = load("plain.html", "<button>Save</button>");
    let (changed, _) = without.apply_dictionary(&dictionary);
    assert_eq!(changed, 0);
}

#[test]
fn test_reserved_terms_are_locked() {
    let mut workspace = load(
        "terms.html",
        "<ul><li>function</li><li>Function</li><li>Layout</li><li>Welcome</li></ul>",
    );

    let locked = workspace.store_mut().lock_reserved_terms();

    let flags: Vec<bool> = workspace.store().iter().map(|u| u.locked).collect();
    assert_eq!(locked, 2);
    assert_eq!(flags, vec![true, false, true, false]);
}

#[test]
fn test_strings_export_dedupes_and_reimports() {
    let dir = tempfile::tempdir().unwrap();
    let mut workspace = load("strings.xml", STRINGS_XML);
    let first = workspace.store().ids()[0].clone();
    workspace.store_mut().set_value(&first, "Olá");

    let exported = workspace.export_strings(dir.path()).unwrap();
    let rows: Vec<StringRecord> =
        serde_json::from_str(&fs::read_to_string(&exported.path).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].kind, "text");
    assert_eq!(rows[0].translated, "Olá");

    let mut fresh = load("strings.xml", STRINGS_XML);
    let changed = fresh.import_strings(&exported.path).unwrap();
    assert_eq!(changed, 2);
    assert!(fresh.store().iter().take(2).all(|u| u.current == "Olá"));
}

#[test]
fn test_strings_import_by_original_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "edits.json",
        r#"[{"original":"Fish & chips","translated":"Peixe com fritas","type":"text","index":99}]"#,
    );
    let mut workspace = load("strings.xml", STRINGS_XML);

    assert_eq!(workspace.import_strings(&path).unwrap(), 1);
    let output = workspace.reinject().unwrap().output;
    assert!(output.contains("<string name=\"c\">Peixe com fritas</string>"));
}

#[test]
fn test_strings_import_from_older_version_keeps_moved_units() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "edits.json",
        r#"[{"original":"Goodbye","translated":"Adeus","type":"text","index":2}]"#,
    );
    let mut workspace = load("strings.xml", STRINGS_XML);

    assert_eq!(workspace.import_strings(&path).unwrap(), 0);
    assert!(workspace.store().iter().all(|unit| !unit.is_edited()));
    assert_eq!(workspace.reinject().unwrap().output, STRINGS_XML);
}

#[test]
fn test_fix_space_tokens() {
    let mut workspace = load("one.html", "<p>Hello world</p>");
    let id = id_of(workspace.store(), "Hello world");
    workspace.store_mut().set_value(&id, "Olá__WS0__mundo");

    assert_eq!(workspace.store_mut().fix_space_tokens(), 1);
    assert_eq!(workspace.store().get(&id).unwrap().current, "Olá mundo");
}

#[test]
fn test_search_ignores_case() {
    let workspace = load("page.html", PAGE_HTML);
    let found: Vec<&str> = workspace
        .store()
        .search("SAVE")
        .into_iter()
        .map(|u| u.original.as_str())
        .collect();

    assert_eq!(found, vec!["Save changes", "Save", "Saved!"]);
}
