//! # Reinjection
//!
//! Writes the values of an `EditStore` back into a copy of the document it
//! was extracted from. The loaded `Document` is never modified.
//!
//! - `html` - edits the cloned arena tree, then serializes it
//! - `xml` - patches the raw text by recorded byte span
//! - `json` - overwrites string leaves of a cloned value
//!
//! Edits that can no longer be located are skipped and listed in the report;
//! they never make the export fail.

pub mod html;
pub mod json;
pub mod xml;

use crate::core::{Document, Parsed, PatchResult};
use crate::extraction::{ExtractionUnit, UnitId};
use crate::store::EditStore;

/// Output document plus the edits that could not be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReinjectReport {
    pub output: String,
    /// Number of edited units written into the output
    pub applied: usize,
    /// Edited units whose target no longer exists
    pub skipped: Vec<UnitId>,
}

impl ReinjectReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Produces the edited document, in the same format as `document`
///
/// A store built for another load of the document (a different generation)
/// has every edit skipped; the unedited document is still produced.
///
/// # Errors
///
/// Only serialization of a JSON document can fail.
pub fn reinject(document: &Document, store: &EditStore) -> PatchResult<ReinjectReport> {
    let stale = store.generation() != document.generation();
    let mut skipped = Vec::new();

    let units: Vec<&ExtractionUnit> = if stale {
        tracing::warn!(
            "Edit store belongs to another load of \"{}\"; skipping all edits",
            document.name()
        );
        skipped.extend(store.iter().filter(|u| u.is_edited()).map(|u| u.id.clone()));
        Vec::new()
    } else {
        store.iter().collect()
    };

    let (output, applied) = match document.parsed() {
        Parsed::Html(tree) => html::reinject_html(tree, &units, &mut skipped),
        Parsed::Xml => xml::reinject_xml(document.raw(), &units, &mut skipped),
        Parsed::Json(value) => json::reinject_json(value, &units, &mut skipped)?,
    };

    for id in &skipped {
        tracing::warn!("Skipped edit for {}: target not found", id);
    }
    tracing::info!(
        "Reinjected {} edits into \"{}\" ({} skipped)",
        applied,
        document.name(),
        skipped.len()
    );

    Ok(ReinjectReport {
        output,
        applied,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentFormat;
    use crate::extraction::extract;

    fn load(name: &str, format: DocumentFormat, raw: &str) -> (Document, EditStore) {
        let document = Document::parse(name, format, raw.to_string()).unwrap();
        let store = EditStore::from_units(document.generation(), extract(&document).unwrap());
        (document, store)
    }

    #[test]
    fn test_stale_store_skips_every_edit() {
        let raw = r#"{"a":"Hello"}"#;
        let (_, mut store) = load("a.json", DocumentFormat::Json, raw);
        let (reloaded, _) = load("a.json", DocumentFormat::Json, raw);
        let id = store.ids()[0].clone();
        store.set_value(&id, "Olá");

        let report = reinject(&reloaded, &store).unwrap();

        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, vec![id]);
        assert!(report.output.contains("\"Hello\""));
    }

    #[test]
    fn test_untouched_store_reports_nothing() {
        let (document, store) = load("p.html", DocumentFormat::Html, "<p>Hello</p>");
        let report = reinject(&document, &store).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.applied, 0);
    }
}
