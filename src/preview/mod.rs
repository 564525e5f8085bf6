//! # Preview
//!
//! Renders a loaded document with the live values of an edit store, without
//! touching either. Two views:
//!
//! - **code**: the substituted source, escaped and highlighted
//! - **page** (HTML only): the substituted document, sanitized again and
//!   placed in a script-less, navigation-less sandboxed `<iframe srcdoc>`
//!
//! Rendering only reads the store, so it can run at any time, including
//! between the requests of a translation run.

pub mod highlight;
pub mod substitute;

use std::fmt;
use std::str::FromStr;

use crate::core::{Document, DocumentFormat, PatchError};
use crate::parsers::sanitize::{escape_attribute, escape_markup, prepare_for_sandbox};
use crate::store::EditStore;

use self::highlight::{highlight_html, highlight_json, highlight_xml};
use self::substitute::{apply_substitutions, substitutions_from_store};

/// Stylesheet for the highlight classes and disabled links
pub const PREVIEW_CSS: &str = "\
.preview-base { margin: 0; padding: 20px; color: #eee; background: #1e1e1e; \
line-height: 1.45; white-space: pre-wrap; overflow-wrap: anywhere; }
.html-page-view { width: 100%; height: 100vh; border: none; background: white; }
.link-disabled { pointer-events: none !important; cursor: default !important; }
.hl-comment { color: #777; }
.hl-tag { color: #f66; }
.hl-attr { color: #6cf; }
.hl-value { color: #fc6; }
.hl-bool { color: #f66; }
.hl-num { color: #9f6; }
.hl-text { color: #ffffff; }
.xml-comment { color: #888; }
.xml-decl { color: #0e6; }
.xml-cdata { color: #ccc; }
.xml-tag { color: #cfcfec; }
.xml-attr { color: #dab0da; }
.xml-value { color: #5aa85a; }
.hl-json-key { color: #4aa3ff; font-weight: 600; }
.hl-json-string { color: #fff; }
.hl-json-number { color: #0a6; }
.hl-json-bool { color: #f66; }
";

/// Rules injected into the sandboxed page itself
const SANDBOX_CSS: &str =
    ".link-disabled { pointer-events: none !important; cursor: default !important; }";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewMode {
    #[default]
    Code,
    Page,
}

impl FromStr for PreviewMode {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(PreviewMode::Code),
            "page" => Ok(PreviewMode::Page),
            other => Err(PatchError::Config(format!("unknown preview mode '{other}'"))),
        }
    }
}

impl fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PreviewMode::Code => write!(f, "code"),
            PreviewMode::Page => write!(f, "page"),
        }
    }
}

/// Raw content with every edited unit substituted in
pub fn substituted_content(document: &Document, store: &EditStore) -> String {
    apply_substitutions(document.raw(), &substitutions_from_store(store))
}

/// Renders the preview fragment
///
/// Page mode only applies to HTML; other formats get the code view.
pub fn render(document: &Document, store: &EditStore, mode: PreviewMode) -> String {
    let content = substituted_content(document, store);

    match (document.format(), mode) {
        (DocumentFormat::Html, PreviewMode::Page) => page_view(&content),
        (format, PreviewMode::Page) => {
            tracing::debug!("Page view is HTML only; showing {} as code", format);
            code_view(format, &content)
        }
        (format, PreviewMode::Code) => code_view(format, &content),
    }
}

/// Wraps `render` in a standalone HTML page carrying the preview stylesheet
pub fn render_standalone(document: &Document, store: &EditStore, mode: PreviewMode) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>",
        escape_markup(document.name()),
        PREVIEW_CSS,
        render(document, store, mode)
    )
}

/// Escaped, highlighted source
pub fn code_view(format: DocumentFormat, content: &str) -> String {
    let highlighted = match format {
        DocumentFormat::Html => highlight_html(content),
        DocumentFormat::Xml => highlight_xml(content),
        DocumentFormat::Json => match serde_json::from_str::<serde_json::Value>(content) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(formatted) => highlight_json(&formatted),
                Err(_) => escape_markup(content),
            },
            // Substitution may have broken the JSON; show it plain
            Err(_) => escape_markup(content),
        },
    };

    format!("<pre class=\"preview-base\">{highlighted}</pre>")
}

/// Sandboxed rendering of HTML content
///
/// The content is always sanitized here, even when the caller already did.
/// An empty `sandbox` attribute disables scripts, forms, popups and
/// top-level navigation.
pub fn page_view(content: &str) -> String {
    let safe = prepare_for_sandbox(content);
    let srcdoc = format!("<style>{SANDBOX_CSS}</style>{safe}");

    format!(
        "<iframe class=\"html-page-view\" sandbox=\"\" referrerpolicy=\"no-referrer\" srcdoc=\"{}\"></iframe>",
        escape_attribute(&srcdoc)
    )
}
