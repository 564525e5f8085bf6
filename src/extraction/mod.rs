//! # Extraction
//!
//! Turns a loaded `Document` into an ordered list of `ExtractionUnit`s, one per
//! translatable string, each with an identity that stays valid for the
//! lifetime of that load.
//!
//! - `html` - text nodes outside code-like elements, and string literals in
//!   inline event handlers
//! - `xml` - character-data runs with their byte spans
//! - `json` - every string leaf, addressed by its key/index path

pub mod html;
pub mod json;
pub mod xml;

use std::fmt;

use crate::core::{Document, Parsed, PatchResult};
use crate::parsers::html::{NodeId, Tree};
use crate::parsers::json::{string_leaves, JsonPath};
use crate::parsers::xml::{scan_text_runs, TextRun};

/// Stable identity of a unit within one loaded document
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitId {
    /// Index of an HTML or XML text unit, in document order
    Text(usize),
    /// Index of an HTML event-handler literal, in document order
    Attribute(usize),
    /// Path of a JSON string leaf
    Json(JsonPath),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnitId::Text(index) => write!(f, "text#{index}"),
            UnitId::Attribute(index) => write!(f, "attr#{index}"),
            UnitId::Json(path) => write!(f, "{path}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    TextNode,
    EventAttributeValue,
    JsonString,
}

impl UnitKind {
    /// Name used for the `type` field of strings exports
    pub fn export_name(&self) -> &'static str {
        match self {
            UnitKind::TextNode => "text",
            UnitKind::EventAttributeValue => "attr",
            UnitKind::JsonString => "json",
        }
    }
}

/// Where a unit lives and how to write it back
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitContext {
    HtmlText {
        node: NodeId,
        /// Whitespace before the text, as found
        prefix: String,
        /// Whitespace after the text, as found
        suffix: String,
    },
    HtmlAttribute {
        node: NodeId,
        attr_name: String,
        /// Literal exactly as written in the attribute value
        raw_literal: String,
        /// Byte offset of `raw_literal` in the attribute value
        offset: usize,
        quote: char,
    },
    XmlText {
        /// Byte span of the whole character-data run in the raw text
        start: usize,
        end: usize,
        prefix: String,
        suffix: String,
    },
    Json,
}

/// One translatable string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    /// Text as found (whitespace collapsed for text nodes)
    pub original: String,
    /// Live value; starts equal to `original`
    pub current: String,
    /// Locked units ignore edits, dictionary application and translation
    pub locked: bool,
    pub context: UnitContext,
}

impl ExtractionUnit {
    pub fn new(id: UnitId, kind: UnitKind, original: String, context: UnitContext) -> Self {
        ExtractionUnit {
            id,
            kind,
            current: original.clone(),
            original,
            locked: false,
            context,
        }
    }

    pub fn is_edited(&self) -> bool {
        self.current != self.original
    }

    /// Attribute name for handler literals
    pub fn attr_name(&self) -> Option<&str> {
        match &self.context {
            UnitContext::HtmlAttribute { attr_name, .. } => Some(attr_name),
            _ => None,
        }
    }

    pub fn json_path(&self) -> Option<&JsonPath> {
        match &self.id {
            UnitId::Json(path) => Some(path),
            _ => None,
        }
    }
}

/// Extracts every unit of `document`, in document order
///
/// # Errors
///
/// Returns `PatchError::Parse` when an XML document is not well-formed. No
/// partial list is ever returned.
pub fn extract(document: &Document) -> PatchResult<Vec<ExtractionUnit>> {
    let units = Extractor::new(document)?.finish();

    tracing::info!(
        "Extracted {} units from \"{}\"",
        units.len(),
        document.name()
    );
    Ok(units)
}

/// What remains to be visited, per format
enum Candidates<'d> {
    Html { tree: &'d Tree, nodes: Vec<NodeId> },
    Xml { raw: &'d str, runs: Vec<TextRun> },
    Json { leaves: Vec<(JsonPath, &'d str)> },
}

impl Candidates<'_> {
    fn len(&self) -> usize {
        match self {
            Candidates::Html { nodes, .. } => nodes.len(),
            Candidates::Xml { runs, .. } => runs.len(),
            Candidates::Json { leaves } => leaves.len(),
        }
    }
}

/// Resumable extraction, a bounded number of candidates at a time
///
/// Candidates are HTML nodes, XML character-data runs or JSON string
/// leaves. Stepping to the end yields the same units as `extract`.
pub struct Extractor<'d> {
    candidates: Candidates<'d>,
    cursor: usize,
    units: Vec<ExtractionUnit>,
    // HTML handler literals, appended after the text units
    handlers: Vec<ExtractionUnit>,
}

impl<'d> Extractor<'d> {
    /// # Errors
    ///
    /// An XML document is scanned up front, so a malformed one fails here,
    /// before any unit exists.
    pub fn new(document: &'d Document) -> PatchResult<Self> {
        let candidates = match document.parsed() {
            Parsed::Html(tree) => Candidates::Html {
                tree,
                nodes: tree.descendants(tree.document()),
            },
            Parsed::Xml => Candidates::Xml {
                raw: document.raw(),
                runs: scan_text_runs(document.raw())?,
            },
            Parsed::Json(value) => Candidates::Json {
                leaves: string_leaves(value),
            },
        };

        Ok(Extractor {
            candidates,
            cursor: 0,
            units: Vec::new(),
            handlers: Vec::new(),
        })
    }

    /// Number of candidates, visited or not
    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    /// Number of candidates visited so far
    pub fn visited(&self) -> usize {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.total()
    }

    /// Visits up to `budget` more candidates
    pub fn step(&mut self, budget: usize) {
        let end = self.cursor.saturating_add(budget).min(self.total());

        match &self.candidates {
            Candidates::Html { tree, nodes } => {
                for &node in &nodes[self.cursor..end] {
                    if let Some(unit) = html::text_unit(*tree, node, self.units.len()) {
                        self.units.push(unit);
                    }
                    html::handler_units(*tree, node, &mut self.handlers);
                }
            }
            Candidates::Xml { raw, runs } => {
                for &run in &runs[self.cursor..end] {
                    if let Some(unit) = xml::run_unit(*raw, run, self.units.len()) {
                        self.units.push(unit);
                    }
                }
            }
            Candidates::Json { leaves } => {
                for (path, text) in &leaves[self.cursor..end] {
                    self.units.push(json::leaf_unit(path.clone(), text));
                }
            }
        }

        self.cursor = end;
    }

    /// Visits whatever is left and returns every unit in document order
    pub fn finish(mut self) -> Vec<ExtractionUnit> {
        self.step(usize::MAX);
        self.units.append(&mut self.handlers);
        self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentFormat;

    fn step_through(document: &Document, budget: usize) -> Vec<ExtractionUnit> {
        let mut extractor = Extractor::new(document).unwrap();
        let mut steps = 0;
        while !extractor.is_done() {
            extractor.step(budget);
            steps += 1;
        }
        assert_eq!(steps, extractor.total().div_ceil(budget));
        extractor.finish()
    }

    #[test]
    fn test_stepping_matches_single_pass() {
        let cases = [
            (
                "page.html",
                DocumentFormat::Html,
                "<p>One</p><button onclick=\"alert('Hi')\">Two</button><p>Three</p>",
            ),
            ("strings.xml", DocumentFormat::Xml, "<r><a>One</a><b>Two</b><c>3</c></r>"),
            ("data.json", DocumentFormat::Json, r#"{"a":"One","b":["Two",3,"Three"]}"#),
        ];

        for (name, format, raw) in cases {
            let document = Document::parse(name, format, raw.to_string()).unwrap();
            assert_eq!(step_through(&document, 2), extract(&document).unwrap(), "{name}");
        }
    }

    #[test]
    fn test_html_handlers_follow_text_when_stepped() {
        let document = Document::parse(
            "page.html",
            DocumentFormat::Html,
            "<button onclick=\"alert('Hi')\">Go</button><p>Later</p>".to_string(),
        )
        .unwrap();

        let ids: Vec<UnitId> = step_through(&document, 1).into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UnitId::Text(0), UnitId::Text(1), UnitId::Attribute(0)]);
    }

    #[test]
    fn test_extractor_reports_progress() {
        let document =
            Document::parse("strings.xml", DocumentFormat::Xml, "<r><a>x</a><b>y</b></r>".to_string())
                .unwrap();
        let mut extractor = Extractor::new(&document).unwrap();
        let total = extractor.total();

        extractor.step(1);
        assert_eq!(extractor.visited(), 1);
        assert!(!extractor.is_done());
        extractor.step(usize::MAX);
        assert_eq!(extractor.visited(), total);
        assert!(extractor.is_done());
    }
}
