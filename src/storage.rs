//! Persisted local state
//!
//! A handful of named slots, each stored as one JSON file in the state
//! directory: the user dictionary and the translation preferences.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::manager::expand_path;
use crate::config::{constants, AppConfig, Provider};
use crate::core::{PatchError, PatchResult};
use crate::dictionary::UserDictionary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    UserDictionary,
    SelectedAiModel,
    TranslationProvider,
    CustomAiKey,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::UserDictionary,
        Slot::SelectedAiModel,
        Slot::TranslationProvider,
        Slot::CustomAiKey,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::UserDictionary => "userDictionary",
            Slot::SelectedAiModel => "selectedAIModel",
            Slot::TranslationProvider => "translationProvider",
            Slot::CustomAiKey => "customIAKey",
        }
    }
}

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    /// State directory from the configuration, else the platform data directory
    pub fn from_config(config: &AppConfig) -> PatchResult<Self> {
        match config.state_dir.as_deref() {
            Some(dir) => Ok(LocalStore::open(expand_path(dir))),
            None => Ok(LocalStore::open(Self::default_dir()?)),
        }
    }

    pub fn default_dir() -> PatchResult<PathBuf> {
        ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| PatchError::Config("no home directory for the state directory".to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }

    /// `Ok(None)` when the slot was never written
    pub fn read<T: DeserializeOwned>(&self, slot: Slot) -> PatchResult<Option<T>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn write<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> PatchResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(slot), serde_json::to_string_pretty(value)?)?;
        tracing::debug!("Saved slot {}", slot.key());
        Ok(())
    }

    pub fn remove(&self, slot: Slot) -> PatchResult<bool> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Reads the dictionary slot, accepting the record list and the legacy flat map
    pub fn load_dictionary(&self) -> PatchResult<UserDictionary> {
        let path = self.slot_path(Slot::UserDictionary);
        if !path.exists() {
            return Ok(UserDictionary::new());
        }
        UserDictionary::load(&path)
    }

    pub fn save_dictionary(&self, dictionary: &UserDictionary) -> PatchResult<()> {
        fs::create_dir_all(&self.dir)?;
        dictionary.save(&self.slot_path(Slot::UserDictionary))
    }

    pub fn provider(&self) -> PatchResult<Option<Provider>> {
        self.read(Slot::TranslationProvider)
    }

    pub fn set_provider(&self, provider: Provider) -> PatchResult<()> {
        self.write(Slot::TranslationProvider, &provider)
    }

    pub fn ai_model(&self) -> PatchResult<Option<String>> {
        self.read(Slot::SelectedAiModel)
    }

    pub fn set_ai_model(&self, model: &str) -> PatchResult<()> {
        self.write(Slot::SelectedAiModel, model)
    }

    pub fn ai_key(&self) -> PatchResult<Option<String>> {
        self.read(Slot::CustomAiKey)
    }

    pub fn set_ai_key(&self, key: &str) -> PatchResult<()> {
        self.write(Slot::CustomAiKey, key)
    }

    /// Fills preferences the configuration left at their defaults
    ///
    /// Values from the configuration file or the environment always win.
    /// Unreadable slots are logged and ignored.
    pub fn apply_preferences(&self, config: &mut AppConfig) {
        if config.provider == Provider::Auto {
            match self.provider() {
                Ok(Some(provider)) => config.provider = provider,
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring saved provider: {}", e),
            }
        }

        if config.ai_model == constants::DEFAULT_AI_MODEL {
            match self.ai_model() {
                Ok(Some(model)) if !model.trim().is_empty() => config.ai_model = model,
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring saved AI model: {}", e),
            }
        }

        if config.ai_key().is_none() {
            match self.ai_key() {
                Ok(Some(key)) if !key.trim().is_empty() => config.ai_key = Some(key),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring saved AI key: {}", e),
            }
        }
    }
}
