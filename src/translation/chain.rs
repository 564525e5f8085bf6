//! Ordered fallback over translation engines
//!
//! Strategies are tried in order until one produces a translation. The cancel
//! flag is checked before each strategy. Results are cached per
//! `(text, from, to)`.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use lru::LruCache;

use super::backends::{http_client, AiBackend, GoogleBackend, MyMemoryBackend, TranslationBackend};
use super::error::{TranslationError, TranslationResult};
use crate::config::{AppConfig, Provider};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    from: String,
    to: String,
}

pub struct FallbackChain {
    strategies: Vec<Box<dyn TranslationBackend>>,
    cache: Mutex<LruCache<CacheKey, String>>,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Box<dyn TranslationBackend>>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);

        FallbackChain {
            strategies,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Builds the engine order for the configured provider
    ///
    /// `auto` and `ai` start with the AI engine when a key is configured,
    /// `google` skips it, `mymemory` uses MyMemory alone.
    pub fn from_config(config: &AppConfig) -> TranslationResult<Self> {
        let client = http_client(config)?;
        let mut strategies: Vec<Box<dyn TranslationBackend>> = Vec::new();

        if matches!(config.provider, Provider::Auto | Provider::Ai) {
            if let Some(key) = config.ai_key() {
                strategies.push(Box::new(AiBackend::new(
                    client.clone(),
                    &config.ai_url,
                    &config.ai_model,
                    key,
                )));
            }
        }
        if config.provider != Provider::MyMemory {
            strategies.push(Box::new(GoogleBackend::new(client.clone(), &config.google_url)));
        }
        strategies.push(Box::new(MyMemoryBackend::new(client, &config.mymemory_url)));

        tracing::debug!(
            "Translation chain: {}",
            strategies.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
        );

        Ok(FallbackChain::new(strategies, config.cache_size))
    }

    /// Names of the engines in order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Translates with the first engine that succeeds
    ///
    /// # Errors
    ///
    /// `Cancelled` when `cancel` was raised before an engine answered,
    /// `Exhausted` when every engine failed.
    pub async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &AtomicBool,
    ) -> TranslationResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let key = CacheKey {
            text: text.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        };
        if let Some(hit) = self.cache_get(&key) {
            tracing::debug!("Cache hit for \"{}\"", text);
            return Ok(hit);
        }

        for strategy in &self.strategies {
            if cancel.load(Ordering::Relaxed) {
                return Err(TranslationError::Cancelled);
            }
            if !strategy.is_available() {
                continue;
            }

            match strategy.translate(text, from, to).await {
                Ok(translated) => {
                    tracing::debug!("{} translated \"{}\"", strategy.name(), text);
                    self.cache_put(key, translated.clone());
                    return Ok(translated);
                }
                Err(e) => {
                    tracing::warn!("{} failed, trying next engine: {}", strategy.name(), e);
                }
            }
        }

        Err(TranslationError::Exhausted)
    }

    /// Like `translate`, but falls back to the input text
    pub async fn translate_or_original(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &AtomicBool,
    ) -> String {
        match self.translate(text, from, to, cancel).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Keeping original text: {}", e);
                text.to_string()
            }
        }
    }

    fn cache_get(&self, key: &CacheKey) -> Option<String> {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, value: String) {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.put(key, value);
    }
}
