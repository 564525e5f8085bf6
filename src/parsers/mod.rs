//! # Parsers
//!
//! Format-level building blocks shared by extraction, reinjection and preview:
//!
//! - `html` - html5ever parse into an arena tree, and its serializer
//! - `js` - string literals inside inline event handlers
//! - `xml` - well-formedness check and character-data runs with byte spans
//! - `json` - key/index paths to string leaves
//! - `sanitize` - script, iframe and event-handler stripping for rendering

pub mod html;
pub mod js;
pub mod json;
pub mod sanitize;
pub mod xml;

// Re-export commonly used items for convenience
pub use html::{html_to_tree, serialize_document, NodeId, Tree};
pub use js::{attr_is_translatable_handler, extract_handler_literals, HandlerLiteral};
pub use json::{JsonPath, PathSegment};
pub use sanitize::{prepare_for_sandbox, sanitize};
pub use xml::{scan_text_runs, TextRun};
