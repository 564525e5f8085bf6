//! Record of applied translations

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::core::PatchResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub original: String,
    pub translated: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct TranslationLog {
    entries: Vec<LogEntry>,
}

impl TranslationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original: &str, translated: &str) {
        tracing::info!("\"{}\" -> \"{}\"", original, translated);
        self.entries.push(LogEntry {
            original: original.to_string(),
            translated: translated.to_string(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Trimmed original to translated; a later entry for the same text wins
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for entry in &self.entries {
            let original = entry.original.trim();
            if original.is_empty() {
                continue;
            }
            map.insert(
                original.to_string(),
                Value::String(entry.translated.trim().to_string()),
            );
        }
        map
    }

    pub fn to_json_string(&self) -> PatchResult<String> {
        Ok(serde_json::to_string_pretty(&Value::Object(self.to_json_map()))?)
    }

    /// `log_traducao_YYYY-MM-DD-HH-MM-SS.json`
    pub fn export_file_name(at: DateTime<Utc>) -> String {
        format!("log_traducao_{}.json", at.format("%Y-%m-%d-%H-%M-%S"))
    }
}
