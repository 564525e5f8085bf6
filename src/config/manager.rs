//! Configuration loading
//!
//! Search order: an explicit path, `$TEXTPATCH_CONFIG`, then the paths in
//! `constants::CONFIG_PATHS`. Environment overrides are applied on top and
//! the result is validated.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::core::{PatchError, PatchResult};
use crate::env::EnvVar;

/// Which translation engine to try first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// AI when a key is configured, then Google, then MyMemory
    #[default]
    Auto,
    Google,
    #[serde(rename = "mymemory")]
    MyMemory,
    Ai,
}

impl FromStr for Provider {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Provider::Auto),
            "google" => Ok(Provider::Google),
            "mymemory" => Ok(Provider::MyMemory),
            "ai" => Ok(Provider::Ai),
            other => Err(PatchError::Config(format!("unknown provider '{other}'"))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Provider::Auto => "auto",
            Provider::Google => "google",
            Provider::MyMemory => "mymemory",
            Provider::Ai => "ai",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    // Languages
    pub source_lang: String,
    pub target_lang: String,

    // Engines
    pub provider: Provider,
    pub ai_model: String,
    pub ai_key: Option<String>,
    pub ai_url: String,
    pub google_url: String,
    pub mymemory_url: String,
    pub timeout_secs: u64,

    // Processing
    pub batch_size: usize,
    pub cache_size: usize,

    // Storage
    pub state_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),

            provider: Provider::Auto,
            ai_model: constants::DEFAULT_AI_MODEL.to_string(),
            ai_key: None,
            ai_url: constants::DEFAULT_AI_URL.to_string(),
            google_url: constants::DEFAULT_GOOGLE_URL.to_string(),
            mymemory_url: constants::DEFAULT_MYMEMORY_URL.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT.as_secs(),

            batch_size: constants::DEFAULT_BATCH_SIZE,
            cache_size: constants::DEFAULT_CACHE_SIZE,

            state_dir: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> PatchResult<()> {
        if self.batch_size == 0 {
            return Err(PatchError::Config("batch_size must be greater than 0".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(PatchError::Config("timeout_secs must be greater than 0".to_string()));
        }

        if self.cache_size == 0 {
            return Err(PatchError::Config("cache_size must be greater than 0".to_string()));
        }

        for (name, url) in [
            ("ai_url", &self.ai_url),
            ("google_url", &self.google_url),
            ("mymemory_url", &self.mymemory_url),
        ] {
            url::Url::parse(url)
                .map_err(|e| PatchError::Config(format!("{name} is not a valid URL: {e}")))?;
        }

        if self.provider == Provider::Ai && self.ai_key.is_none() {
            tracing::warn!("Provider 'ai' selected without an API key; falling back to free engines");
        }

        Ok(())
    }

    /// Applies `TEXTPATCH_*` variables; invalid values are logged and ignored
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{core, translation};

        env_override::<translation::TargetLang, _>(|lang: String| self.target_lang = lang);
        env_override::<translation::SourceLang, _>(|lang: String| self.source_lang = lang);
        env_override::<translation::Provider, _>(|provider: String| match provider.parse() {
            Ok(provider) => self.provider = provider,
            Err(e) => tracing::warn!("{}", e),
        });
        env_override::<translation::AiKey, _>(|key: String| {
            tracing::info!("AI key taken from the environment");
            self.ai_key = Some(key);
        });
        env_override::<translation::AiModel, _>(|model: String| self.ai_model = model);
        env_override::<translation::Timeout, _>(|timeout: Duration| self.timeout_secs = timeout.as_secs());
        env_override::<core::StateDir, _>(|dir: String| self.state_dir = Some(dir));
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Key for the AI engine, if one is configured and not blank
    pub fn ai_key(&self) -> Option<&str> {
        self.ai_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Loads and holds the effective configuration
pub struct ConfigManager {
    config: AppConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads the first configuration file found, applies the environment and validates
    pub fn load(explicit: Option<&Path>) -> PatchResult<Self> {
        Self::load_dotenv();

        let source = Self::find_config_file(explicit)?;
        let mut config = match &source {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                AppConfig::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, source })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// File the configuration was read from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn find_config_file(explicit: Option<&Path>) -> PatchResult<Option<PathBuf>> {
        use crate::env::core;

        if let Some(path) = explicit {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                return Err(PatchError::Config(format!(
                    "configuration file {} not found",
                    expanded.display()
                )));
            }
            return Ok(Some(expanded));
        }

        if let Ok(Some(path)) = core::ConfigPath::get_set() {
            let expanded = expand_path(&path);
            if expanded.exists() {
                return Ok(Some(expanded));
            }
            tracing::warn!("{} points to missing file {}", core::ConfigPath::NAME, path);
        }

        Ok(constants::CONFIG_PATHS
            .iter()
            .map(|path| expand_path(path))
            .find(|path| path.exists()))
    }

    pub fn load_from_file(path: &Path) -> PatchResult<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PatchError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            PatchError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::debug!("Loaded environment file {}", env_file);
                break;
            }
        }
    }

    /// Writes the default configuration as TOML
    pub fn generate_example_config(path: &Path) -> PatchResult<()> {
        let content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| PatchError::Config(format!("failed to serialize configuration: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn env_override<V: EnvVar<T>, T>(apply: impl FnOnce(T)) {
    match V::get_set() {
        Ok(Some(value)) => apply(value),
        Ok(None) => {}
        Err(e) => tracing::warn!("{}", e),
    }
}

/// Expands `~` and environment variables in a path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.target_lang, "pt");
        assert_eq!(config.ai_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_validate_rejects_zero_batch_and_timeout() {
        let mut config = AppConfig::default();
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(PatchError::Config(_))));

        let mut config = AppConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig =
            toml::from_str("target_lang = \"es\"\nprovider = \"mymemory\"\n").unwrap();

        assert_eq!(config.target_lang, "es");
        assert_eq!(config.provider, Provider::MyMemory);
        assert_eq!(config.source_lang, "auto");
        assert_eq!(config.batch_size, 200);
    }

    #[test]
    fn test_load_from_file_and_example_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textpatch.toml");

        ConfigManager::generate_example_config(&path).unwrap();
        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(loaded.mymemory_url, constants::DEFAULT_MYMEMORY_URL);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = ConfigManager::load(Some(Path::new("/nonexistent/textpatch.toml")));
        assert!(matches!(result, Err(PatchError::Config(_))));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Google".parse::<Provider>().unwrap(), Provider::Google);
        assert!("deepl".parse::<Provider>().is_err());
        assert_eq!(Provider::MyMemory.to_string(), "mymemory");
    }
}
