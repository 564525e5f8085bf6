use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use thiserror::Error;

use crate::parsers::html::{html_to_tree, Tree};

/// Errors surfaced by the extraction / reinjection core
///
/// Every public operation of the crate returns either a value or one of these;
/// stale ids at export time are not errors (see `reinject::ReinjectReport`).
#[derive(Error, Debug)]
pub enum PatchError {
    /// The document could not be parsed under its declared format
    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: DocumentFormat,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A regex-flagged dictionary entry that does not compile
    #[error("invalid dictionary pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PatchError {
    pub fn parse(format: DocumentFormat, message: impl fmt::Display) -> Self {
        PatchError::Parse {
            format,
            message: message.to_string(),
        }
    }
}

pub type PatchResult<T> = Result<T, PatchError>;

/// Declared format of a loaded document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Html,
    Xml,
    Json,
}

impl DocumentFormat {
    /// Infers the format from a file name extension (`.html`/`.htm`, `.xml`, `.json`)
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lowercased = file_name.to_lowercase();

        if lowercased.ends_with(".html") || lowercased.ends_with(".htm") {
            Some(DocumentFormat::Html)
        } else if lowercased.ends_with(".xml") {
            Some(DocumentFormat::Xml)
        } else if lowercased.ends_with(".json") {
            Some(DocumentFormat::Json)
        } else {
            None
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            DocumentFormat::Html => "text/html",
            DocumentFormat::Xml => "application/xml",
            DocumentFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocumentFormat::Html => write!(f, "HTML"),
            DocumentFormat::Xml => write!(f, "XML"),
            DocumentFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Identifies one load of a document
///
/// A fresh generation is drawn on every load, so an edit store built for one
/// load never matches a reloaded document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Generation(u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    pub fn next() -> Self {
        Generation(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Format-specific parsed representation kept next to the raw text
#[derive(Clone, Debug)]
pub enum Parsed {
    /// Live tree; the export source of truth for HTML
    Html(Tree),
    /// XML exports patch the raw text, nothing else is kept
    Xml,
    /// Structural value cloned on export
    Json(serde_json::Value),
}

/// A loaded document: raw text, declared format and its parsed form
///
/// Immutable after load; reinjection always works on copies.
#[derive(Clone, Debug)]
pub struct Document {
    name: String,
    format: DocumentFormat,
    raw: String,
    parsed: Parsed,
    generation: Generation,
}

impl Document {
    /// Parses `raw` under the declared `format`
    ///
    /// # Errors
    ///
    /// Returns `PatchError::Parse` when the text is not valid under `format`.
    /// HTML parsing is error-tolerant and never fails here.
    pub fn parse(name: &str, format: DocumentFormat, raw: String) -> PatchResult<Self> {
        let parsed = match format {
            DocumentFormat::Html => Parsed::Html(html_to_tree(&raw)),
            DocumentFormat::Xml => {
                crate::parsers::xml::scan_text_runs(&raw)?;
                Parsed::Xml
            }
            DocumentFormat::Json => Parsed::Json(
                serde_json::from_str(&raw).map_err(|e| PatchError::parse(format, e))?,
            ),
        };

        tracing::info!("Loaded {} document \"{}\" ({} bytes)", format, name, raw.len());

        Ok(Document {
            name: name.to_string(),
            format,
            raw,
            parsed,
            generation: Generation::next(),
        })
    }

    /// Reads and parses a file, inferring the format from its extension
    pub fn from_path(path: &Path) -> PatchResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let format = DocumentFormat::from_file_name(&name)
            .ok_or_else(|| PatchError::UnsupportedFormat(name.clone()))?;
        let data = fs::read(path)?;

        Document::parse(&name, format, decode_input(&data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> &Parsed {
        &self.parsed
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Decodes raw file bytes into text
///
/// A byte order mark wins; otherwise UTF-8 is assumed and windows-1252 is used
/// when the bytes are not valid UTF-8.
pub fn decode_input(data: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(data) {
        let (text, _) = encoding.decode_without_bom_handling(&data[bom_length..]);
        return text.to_string();
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(data);
    if had_errors {
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(data);
        text.to_string()
    } else {
        text.to_string()
    }
}

/// Suffix appended to the base name of exported documents
pub const EXPORT_SUFFIX: &str = "-traduzido";
pub const STRINGS_EXPORT_FILE_NAME: &str = "strings_export.json";
pub const DICTIONARY_EXPORT_FILE_NAME: &str = "dicionario.json";

/// Builds `<basename>-traduzido<ext>` for an input file name
pub fn format_output_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!(
            "{}{}{}",
            &file_name[..dot],
            EXPORT_SUFFIX,
            &file_name[dot..]
        ),
        _ => format!("{file_name}{EXPORT_SUFFIX}"),
    }
}

/// MIME type of an exported file, always UTF-8
pub fn detect_media_type_by_file_name(file_name: &str) -> String {
    let media_type = DocumentFormat::from_file_name(file_name)
        .map(|f| f.media_type())
        .unwrap_or("text/plain");

    format!("{media_type};charset=utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            DocumentFormat::from_file_name("index.HTM"),
            Some(DocumentFormat::Html)
        );
        assert_eq!(
            DocumentFormat::from_file_name("strings.xml"),
            Some(DocumentFormat::Xml)
        );
        assert_eq!(
            DocumentFormat::from_file_name("en.json"),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_file_name("notes.txt"), None);
    }

    #[test]
    fn test_format_output_name() {
        assert_eq!(format_output_name("page.html"), "page-traduzido.html");
        assert_eq!(format_output_name("a.b.json"), "a.b-traduzido.json");
        assert_eq!(format_output_name("README"), "README-traduzido");
    }

    #[test]
    fn test_detect_media_type_by_file_name() {
        assert_eq!(
            detect_media_type_by_file_name("x.json"),
            "application/json;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("x.xml"),
            "application/xml;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("x.htm"),
            "text/html;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("x.csv"),
            "text/plain;charset=utf-8"
        );
    }

    #[test]
    fn test_decode_input_fallbacks() {
        assert_eq!(decode_input("olá".as_bytes()), "olá");
        assert_eq!(decode_input(b"\xEF\xBB\xBFhi"), "hi");
        assert_eq!(decode_input(b"caf\xE9"), "café");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = Document::parse("x.json", DocumentFormat::Json, "{\"a\":".to_string());
        assert!(matches!(result, Err(PatchError::Parse { .. })));
    }

    #[test]
    fn test_generations_are_unique() {
        let a = Document::parse("a.json", DocumentFormat::Json, "{}".to_string()).unwrap();
        let b = Document::parse("a.json", DocumentFormat::Json, "{}".to_string()).unwrap();
        assert_ne!(a.generation(), b.generation());
    }
}
