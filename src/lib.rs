//! # Textpatch
//!
//! Extracts the translatable strings of HTML, XML and JSON documents, lets
//! them be edited (by hand, by a user dictionary or by machine translation),
//! and writes them back into a copy of the document without disturbing the
//! markup around them.
//!
//! ## Module organization
//!
//! - `core` - documents, formats, errors, export naming
//! - `parsers` - HTML tree, XML scanner, JSON paths, sanitizer
//! - `extraction` - document to ordered extraction units
//! - `store` - the edit store and its mutations
//! - `dictionary` - user substitution rules
//! - `reinject` - edited values back into the document
//! - `preview` - live substitution, highlighting, sandboxed page view
//! - `translation` - backends, fallback chain, cancellable runs
//! - `workspace` - load and export glue
//! - `config`, `env`, `storage` - settings and persisted local state
//! - `utils` - text helpers

pub mod config;
pub mod core;
pub mod dictionary;
pub mod env;
pub mod extraction;
pub mod parsers;
pub mod preview;
pub mod reinject;
pub mod storage;
pub mod store;
pub mod translation;
pub mod utils;
pub mod workspace;

// Re-export commonly used items for convenience
pub use config::{AppConfig, ConfigManager, Provider};
pub use core::{Document, DocumentFormat, Generation, PatchError, PatchResult};
pub use dictionary::{DictEntry, UserDictionary};
pub use extraction::{extract, ExtractionUnit, Extractor, UnitContext, UnitId, UnitKind};
pub use parsers::sanitize::sanitize;
pub use preview::PreviewMode;
pub use reinject::{reinject, ReinjectReport};
pub use storage::LocalStore;
pub use store::{EditOutcome, EditStore, StringRecord};
pub use workspace::Workspace;
