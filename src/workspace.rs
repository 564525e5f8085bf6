//! # Workspace
//!
//! One loaded document and its edit store, plus the export artifacts built
//! from them: the reinjected document, the strings export, the dictionary
//! export and the translation log.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::core::{
    detect_media_type_by_file_name, format_output_name, Document, PatchError, PatchResult,
    DICTIONARY_EXPORT_FILE_NAME, STRINGS_EXPORT_FILE_NAME,
};
use crate::dictionary::UserDictionary;
use crate::extraction::{extract, Extractor};
use crate::preview::{self, PreviewMode};
use crate::reinject::{reinject, ReinjectReport};
use crate::store::{EditStore, StringRecord};
use crate::translation::TranslationLog;

/// A file written by an export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    /// Always carries `charset=utf-8`
    pub media_type: String,
}

impl ExportedFile {
    fn write(path: &Path, content: &str) -> PatchResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let exported = ExportedFile {
            path: path.to_path_buf(),
            media_type: detect_media_type_by_file_name(&file_name),
        };
        tracing::info!("Exported {} ({})", exported.path.display(), exported.media_type);
        Ok(exported)
    }
}

/// Outcome of exporting the document itself
#[derive(Clone, Debug)]
pub struct DocumentExport {
    pub file: ExportedFile,
    pub report: ReinjectReport,
}

pub struct Workspace {
    document: Document,
    store: EditStore,
}

impl Workspace {
    /// Reads, parses and extracts a file
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for an unknown extension, `Parse` for malformed
    /// input, `Io` when the file cannot be read.
    pub fn open(path: &Path) -> PatchResult<Self> {
        Self::load(Document::from_path(path)?)
    }

    /// Extracts `document` into a fresh store
    pub fn load(document: Document) -> PatchResult<Self> {
        let units = extract(&document)?;
        let store = EditStore::from_units(document.generation(), units);
        Ok(Workspace { document, store })
    }

    /// Like `load`, but walks the document `batch_size` candidates at a time
    /// and yields to the runtime between batches
    pub async fn load_cooperative(document: Document, batch_size: usize) -> PatchResult<Self> {
        if batch_size == 0 {
            return Err(PatchError::Config("batch size must be positive".to_string()));
        }

        let units = {
            let mut extractor = Extractor::new(&document)?;
            while !extractor.is_done() {
                extractor.step(batch_size);
                tracing::debug!("Visited {}/{} candidates", extractor.visited(), extractor.total());
                tokio::task::yield_now().await;
            }
            extractor.finish()
        };

        tracing::info!("Extracted {} units from \"{}\"", units.len(), document.name());
        let store = EditStore::from_units(document.generation(), units);
        Ok(Workspace { document, store })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &EditStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditStore {
        &mut self.store
    }

    pub fn into_store(self) -> EditStore {
        self.store
    }

    pub fn into_parts(self) -> (Document, EditStore) {
        (self.document, self.store)
    }

    /// Swaps in a store, e.g. after a translation run owned it
    pub fn replace_store(&mut self, store: EditStore) -> EditStore {
        std::mem::replace(&mut self.store, store)
    }

    /// Runs the dictionary over every unit
    ///
    /// Returns how many units changed and the entries that were skipped for
    /// invalid patterns.
    pub fn apply_dictionary(&mut self, dictionary: &UserDictionary) -> (usize, Vec<PatchError>) {
        let (compiled, errors) = dictionary.compile();
        let changed = self
            .store
            .apply_dictionary_all(&compiled, self.document.raw());
        tracing::info!("Dictionary changed {} units", changed);
        (changed, errors)
    }

    /// Applies a strings export file; returns how many units changed
    pub fn import_strings(&mut self, path: &Path) -> PatchResult<usize> {
        let records: Vec<StringRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
        let changed = self.store.import_strings(&records);
        tracing::info!("Imported {} rows from {}, {} units changed", records.len(), path.display(), changed);
        Ok(changed)
    }

    pub fn reinject(&self) -> PatchResult<ReinjectReport> {
        reinject(&self.document, &self.store)
    }

    pub fn preview(&self, mode: PreviewMode) -> String {
        preview::render_standalone(&self.document, &self.store, mode)
    }

    /// `<basename>-traduzido<ext>`
    pub fn output_file_name(&self) -> String {
        format_output_name(self.document.name())
    }

    /// Writes the reinjected document to `path`
    pub fn write_document(&self, path: &Path) -> PatchResult<DocumentExport> {
        let report = self.reinject()?;
        let file = ExportedFile::write(path, &report.output)?;
        Ok(DocumentExport { file, report })
    }

    /// Writes the reinjected document under its export name in `dir`
    pub fn export_document(&self, dir: &Path) -> PatchResult<DocumentExport> {
        self.write_document(&dir.join(self.output_file_name()))
    }

    pub fn strings_json(&self) -> PatchResult<String> {
        Ok(serde_json::to_string_pretty(&self.store.export_strings())?)
    }

    pub fn write_strings(&self, path: &Path) -> PatchResult<ExportedFile> {
        ExportedFile::write(path, &self.strings_json()?)
    }

    /// Writes `strings_export.json` in `dir`
    pub fn export_strings(&self, dir: &Path) -> PatchResult<ExportedFile> {
        self.write_strings(&dir.join(STRINGS_EXPORT_FILE_NAME))
    }
}

pub fn write_dictionary(dictionary: &UserDictionary, path: &Path) -> PatchResult<ExportedFile> {
    ExportedFile::write(path, &dictionary.to_json_string()?)
}

/// Writes `dicionario.json` in `dir`
pub fn export_dictionary(dictionary: &UserDictionary, dir: &Path) -> PatchResult<ExportedFile> {
    write_dictionary(dictionary, &dir.join(DICTIONARY_EXPORT_FILE_NAME))
}

pub fn write_log(log: &TranslationLog, path: &Path) -> PatchResult<ExportedFile> {
    ExportedFile::write(path, &log.to_json_string()?)
}

/// Writes `log_traducao_<timestamp>.json` in `dir`
pub fn export_log(log: &TranslationLog, dir: &Path, at: DateTime<Utc>) -> PatchResult<ExportedFile> {
    write_log(log, &dir.join(TranslationLog::export_file_name(at)))
}
