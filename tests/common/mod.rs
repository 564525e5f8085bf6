// Shared helpers for the integration tests

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;

use textpatch::core::{Document, DocumentFormat};
use textpatch::extraction::UnitId;
use textpatch::store::EditStore;
use textpatch::translation::{TranslationBackend, TranslationError, TranslationResult};
use textpatch::workspace::Workspace;

pub const SIMPLE_HTML: &str = "<p>Hello <b>World</b></p>";

pub const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Settings</title><style>p { color: red; }</style></head>
<body>
  <h1>  Save   changes </h1>
  <p>Press <code>save()</code> to keep your work.</p>
  <button onclick="alert('Saved!')">Save</button>
  <script>var label = "Not text";</script>
</body>
</html>"#;

pub const STRINGS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- labels -->
<resources>
  <string name="a">Hello</string>
  <string name="b">Hello</string>
  <string name="c">Fish &amp; chips</string>
  <string name="d"><![CDATA[raw <b>markup</b>]]></string>
</resources>"#;

pub const SCENARIO_JSON: &str = r#"{"a":"Hello","b":["World"]}"#;

/// Parses `raw` under the format its name implies and extracts it
pub fn load(name: &str, raw: &str) -> Workspace {
    let format = DocumentFormat::from_file_name(name).expect("fixtures use known extensions");
    let document = Document::parse(name, format, raw.to_string()).expect("fixture parses");
    Workspace::load(document).expect("fixture extracts")
}

/// Id of the first unit whose original is `original`
pub fn id_of(store: &EditStore, original: &str) -> UnitId {
    store
        .iter()
        .find(|unit| unit.original == original)
        .map(|unit| unit.id.clone())
        .unwrap_or_else(|| panic!("no unit with original {original:?}"))
}

pub fn originals(store: &EditStore) -> Vec<String> {
    store.iter().map(|unit| unit.original.clone()).collect()
}

pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("fixture written");
    path
}

/// Engine answering from a fixed table and failing on anything else
pub struct TableBackend {
    name: &'static str,
    table: HashMap<String, String>,
}

impl TableBackend {
    pub fn new(name: &'static str, pairs: &[(&str, &str)]) -> Self {
        TableBackend {
            name,
            table: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl TranslationBackend for TableBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        _from: &'a str,
        _to: &'a str,
    ) -> BoxFuture<'a, TranslationResult<String>> {
        async move {
            tokio::task::yield_now().await;
            self.table
                .get(text)
                .cloned()
                .ok_or_else(|| TranslationError::Network(format!("{} has no entry", self.name)))
        }
        .boxed()
    }
}
