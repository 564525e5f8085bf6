//! Sequential translation of an edit store
//!
//! Units are translated one at a time in store order so progress only moves
//! forward. The store is borrowed only between requests: other code on the
//! same task may lock or edit units while a request is in flight, and a
//! reply for a unit that became locked in the meantime is dropped.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::chain::FallbackChain;
use super::error::{TranslationError, TranslationResult};
use super::log::TranslationLog;
use super::spacing::{preserve_spaces, restore_spaces, tidy_punctuation};
use crate::extraction::UnitId;
use crate::store::{EditOutcome, EditStore};

/// Shared cancellation flag; raising it stops a run before its next unit
pub type CancelFlag = Arc<AtomicBool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100 + self.total / 2) / self.total).min(100) as u8
    }
}

/// What a run did, unit by unit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub translated: usize,
    /// Locked or blank units that were never sent
    pub skipped: usize,
    /// The engine answered with the current value
    pub unchanged: usize,
    /// Every engine failed; the unit kept its value
    pub failed: usize,
    /// Replies dropped because the unit was locked or removed meanwhile
    pub discarded: usize,
    pub cancelled: bool,
}

pub struct TranslationRun<'a> {
    chain: &'a FallbackChain,
    from: String,
    to: String,
    cancel: CancelFlag,
}

impl<'a> TranslationRun<'a> {
    pub fn new(chain: &'a FallbackChain, from: &str, to: &str) -> Self {
        TranslationRun {
            chain,
            from: from.to_string(),
            to: to.to_string(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Sends `text` through the chain with its whitespace runs protected
    pub async fn translate_text(&self, text: &str, from: &str) -> TranslationResult<String> {
        let (tokenized, spaces) = preserve_spaces(text);
        let translated = self
            .chain
            .translate(&tokenized, from, &self.to, &self.cancel)
            .await?;

        Ok(restore_spaces(&tidy_punctuation(&translated), &spaces))
    }

    /// Translates every unlocked, non-blank unit in order
    ///
    /// Already applied translations stay when the run is cancelled.
    pub async fn run(
        &self,
        store: &RefCell<EditStore>,
        log: &mut TranslationLog,
        mut on_progress: impl FnMut(Progress),
    ) -> RunSummary {
        let ids = store.borrow().ids();
        let total = ids.len();
        let mut summary = RunSummary::default();

        tracing::info!("Translating {} units from {} to {}", total, self.from, self.to);

        for (i, id) in ids.iter().enumerate() {
            if self.is_cancelled() {
                tracing::info!("Translation cancelled after {} of {} units", i, total);
                summary.cancelled = true;
                break;
            }

            let pending = {
                let store = store.borrow();
                store
                    .get(id)
                    .filter(|unit| !unit.locked && !unit.current.trim().is_empty())
                    .map(|unit| unit.current.clone())
            };

            match pending {
                None => summary.skipped += 1,
                Some(source) => match self.translate_text(&source, &self.from).await {
                    Ok(translated) => {
                        self.store_result(store, id, &source, &translated, log, &mut summary)
                    }
                    Err(TranslationError::Cancelled) => {
                        summary.cancelled = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Leaving {} untranslated: {}", id, e);
                        summary.failed += 1;
                    }
                },
            }

            on_progress(Progress {
                completed: i + 1,
                total,
            });
        }

        tracing::info!(
            "Translation finished: {} translated, {} skipped, {} failed",
            summary.translated,
            summary.skipped,
            summary.failed
        );
        summary
    }

    fn store_result(
        &self,
        store: &RefCell<EditStore>,
        id: &UnitId,
        source: &str,
        translated: &str,
        log: &mut TranslationLog,
        summary: &mut RunSummary,
    ) {
        match store.borrow_mut().set_value(id, translated) {
            EditOutcome::Applied => {
                log.record(source, translated);
                summary.translated += 1;
            }
            EditOutcome::Unchanged => summary.unchanged += 1,
            EditOutcome::Locked | EditOutcome::Missing => {
                tracing::debug!("Dropping translation for {}: unit locked meanwhile", id);
                summary.discarded += 1;
            }
        }
    }

    /// Retranslates one unit; an answer equal to the input is retried from English
    pub async fn retry_unit(
        &self,
        store: &RefCell<EditStore>,
        id: &UnitId,
        log: &mut TranslationLog,
    ) -> TranslationResult<EditOutcome> {
        let source = match store.borrow().get(id) {
            Some(unit) if unit.locked => return Ok(EditOutcome::Locked),
            Some(unit) => unit.current.clone(),
            None => return Ok(EditOutcome::Missing),
        };

        let mut translated = self.translate_text(&source, &self.from).await?;
        if translated.trim().to_lowercase() == source.trim().to_lowercase() && self.from != "en" {
            translated = self.translate_text(&source, "en").await?;
        }

        let outcome = store.borrow_mut().set_value(id, &translated);
        if outcome == EditOutcome::Applied {
            log.record(&source, &translated);
        }
        Ok(outcome)
    }
}
