//! Translation of edit store units
//!
//! - **backends**: the HTTP engines behind `TranslationBackend`
//! - **chain**: ordered fallback over engines, with a result cache
//! - **session**: sequential, cancellable runs over an `EditStore`
//! - **spacing**: whitespace placeholders and punctuation cleanup
//! - **log**: record of applied translations
//! - **error**: engine failures
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//!
//! use textpatch::config::AppConfig;
//! use textpatch::translation::{FallbackChain, TranslationLog, TranslationRun};
//! use textpatch::workspace::Workspace;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let workspace = Workspace::open(std::path::Path::new("page.html"))?;
//! let chain = FallbackChain::from_config(&config)?;
//! let run = TranslationRun::new(&chain, &config.source_lang, &config.target_lang);
//!
//! let store = RefCell::new(workspace.into_store());
//! let mut log = TranslationLog::new();
//! let summary = run.run(&store, &mut log, |p| println!("{}%", p.percent())).await;
//! println!("{} units translated", summary.translated);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod chain;
pub mod error;
pub mod log;
pub mod session;
pub mod spacing;

// ============================================================================
// Re-exports
// ============================================================================

pub use backends::{AiBackend, GoogleBackend, MyMemoryBackend, TranslationBackend};
pub use chain::FallbackChain;
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use log::{LogEntry, TranslationLog};
pub use session::{CancelFlag, Progress, RunSummary, TranslationRun};
pub use spacing::{preserve_spaces, restore_spaces, tidy_punctuation, SpaceMap};
