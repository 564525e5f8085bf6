//! Translation engines
//!
//! Each engine is one HTTP round trip behind `TranslationBackend`. Engines
//! report every kind of failure as a `TranslationError`; choosing what to do
//! next is left to the fallback chain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{TranslationError, TranslationResult};
use crate::config::{constants, AppConfig};
use crate::utils::{letters_only, static_regex};

/// One translation engine
pub trait TranslationBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the engine can currently be asked at all
    fn is_available(&self) -> bool {
        true
    }

    /// Translates `text` from `from` (`auto` for detection) to `to`
    fn translate<'a>(
        &'a self,
        text: &'a str,
        from: &'a str,
        to: &'a str,
    ) -> BoxFuture<'a, TranslationResult<String>>;
}

/// Builds the shared HTTP client
pub fn http_client(config: &AppConfig) -> TranslationResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(TranslationError::from)
}

async fn get_json(client: &reqwest::Client, url: reqwest::Url) -> TranslationResult<Value> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TranslationError::Http {
            status: status.as_u16(),
        });
    }
    Ok(response.json::<Value>().await?)
}

fn build_url(base: &str, params: &[(&str, &str)]) -> TranslationResult<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params)
        .map_err(|e| TranslationError::InvalidResponse(format!("bad endpoint {base}: {e}")))
}

/// Unofficial Google endpoint, `translate_a/single?client=gtx`
pub struct GoogleBackend {
    client: reqwest::Client,
    url: String,
}

impl GoogleBackend {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        GoogleBackend {
            client,
            url: url.to_string(),
        }
    }

    async fn request(&self, text: &str, from: &str, to: &str) -> TranslationResult<String> {
        let url = build_url(
            &self.url,
            &[("client", "gtx"), ("sl", from), ("tl", to), ("dt", "t"), ("q", text)],
        )?;
        let data = get_json(&self.client, url).await?;
        let translated = parse_google_reply(&data)?;

        // An echo of the input counts as a failure so the next engine gets a turn
        if translated.chars().count() < 2 || letters_only(&translated) == letters_only(text) {
            return Err(TranslationError::Unchanged);
        }
        Ok(translated)
    }
}

/// Joins the sentence fragments of a `translate_a/single` reply
fn parse_google_reply(data: &Value) -> TranslationResult<String> {
    let sentences = data
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::InvalidResponse("missing sentence list".to_string()))?;

    Ok(sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect())
}

impl TranslationBackend for GoogleBackend {
    fn name(&self) -> &'static str {
        "google"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        from: &'a str,
        to: &'a str,
    ) -> BoxFuture<'a, TranslationResult<String>> {
        self.request(text, from, to).boxed()
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    #[serde(default)]
    translated_text: Option<String>,
    #[serde(default)]
    detected_source_language: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryReply {
    #[serde(default)]
    response_data: Option<MyMemoryData>,
}

/// MyMemory free API
pub struct MyMemoryBackend {
    client: reqwest::Client,
    url: String,
}

impl MyMemoryBackend {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        MyMemoryBackend {
            client,
            url: url.to_string(),
        }
    }

    async fn query(&self, text: &str, langpair: &str) -> TranslationResult<MyMemoryData> {
        let url = build_url(&self.url, &[("q", text), ("langpair", langpair)])?;
        let data = get_json(&self.client, url).await?;
        let reply: MyMemoryReply = serde_json::from_value(data)?;
        Ok(reply.response_data.unwrap_or_default())
    }

    /// MyMemory has no `auto`; ask it for the source language of a sample
    async fn detect_language(&self, text: &str) -> String {
        let sample: String = text.chars().take(constants::LANGUAGE_DETECTION_SAMPLE).collect();

        match self.query(&sample, "auto|en").await {
            Ok(MyMemoryData {
                detected_source_language: Some(lang),
                ..
            }) if !lang.trim().is_empty() => lang,
            Ok(_) => "en".to_string(),
            Err(e) => {
                tracing::debug!("MyMemory language detection failed, assuming en: {}", e);
                "en".to_string()
            }
        }
    }

    async fn request(&self, text: &str, from: &str, to: &str) -> TranslationResult<String> {
        let from = if from.is_empty() || from == "auto" {
            self.detect_language(text).await
        } else {
            from.to_string()
        };

        let data = self.query(text, &format!("{from}|{to}")).await?;
        let translated = data.translated_text.unwrap_or_default();

        if translated.to_uppercase().contains("MYMEMORY WARNING") {
            return Err(TranslationError::QuotaExceeded(
                "MyMemory free limit reached".to_string(),
            ));
        }
        if translated.trim().is_empty() {
            return Err(TranslationError::InvalidResponse("empty translation".to_string()));
        }
        Ok(translated)
    }
}

impl TranslationBackend for MyMemoryBackend {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        from: &'a str,
        to: &'a str,
    ) -> BoxFuture<'a, TranslationResult<String>> {
        self.request(text, from, to).boxed()
    }
}

/// Chat-completion engine, used only when a key is configured
///
/// A quota or billing error switches the engine off for the rest of the
/// process.
pub struct AiBackend {
    client: reqwest::Client,
    url: String,
    model: String,
    key: String,
    disabled: AtomicBool,
}

impl AiBackend {
    pub fn new(client: reqwest::Client, url: &str, model: &str, key: &str) -> Self {
        let model = if model.trim().is_empty() {
            constants::DEFAULT_AI_MODEL
        } else {
            model.trim()
        };

        AiBackend {
            client,
            url: url.to_string(),
            model: model.to_string(),
            key: key.to_string(),
            disabled: AtomicBool::new(false),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, text: &str, to: &str) -> Value {
        json!({
            "model": self.model,
            "response_format": { "type": "text" },
            "messages": [
                {
                    "role": "system",
                    "content": format!(
                        "Traduza o texto fornecido para {to}, retornando apenas o texto traduzido. \
                         Se o texto já estiver no idioma de destino, repita-o sem alterações."
                    ),
                },
                { "role": "user", "content": text },
            ],
        })
    }

    async fn request(&self, text: &str, to: &str) -> TranslationResult<String> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&self.request_body(text, to))
            .send()
            .await?;
        // Error replies carry a JSON body worth reading, so the status is checked last
        let status = response.status();
        let data: Value = response.json().await?;

        match parse_ai_reply(&data) {
            Err(TranslationError::QuotaExceeded(message)) => {
                self.disabled.store(true, Ordering::Relaxed);
                Err(TranslationError::QuotaExceeded(message))
            }
            Err(TranslationError::InvalidResponse(_)) if !status.is_success() => {
                Err(TranslationError::Http {
                    status: status.as_u16(),
                })
            }
            other => other,
        }
    }
}

/// Extracts the assistant reply, rejecting chatter instead of a translation
fn parse_ai_reply(data: &Value) -> TranslationResult<String> {
    static QUOTA: OnceLock<Regex> = OnceLock::new();
    static CHATTER: OnceLock<Regex> = OnceLock::new();

    if let Some(error) = data.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown AI error")
            .to_string();
        let quota = QUOTA.get_or_init(|| static_regex("(?i)quota|billing|credit|exceeded"));
        if quota.is_match(&message) {
            return Err(TranslationError::QuotaExceeded(message));
        }
        return Err(TranslationError::InvalidResponse(message));
    }

    let content = data
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();

    let chatter = CHATTER.get_or_init(|| {
        static_regex(
            "(?i)^claro|^aqui está|^tradução:|^explicação|desculp|como modelo|não posso|sinto muito|não entendi|instrução|ignore",
        )
    });
    if chatter.is_match(content) {
        return Err(TranslationError::InvalidResponse(
            "reply is not a bare translation".to_string(),
        ));
    }

    let content = strip_quotes(content);
    if content.is_empty() {
        return Err(TranslationError::InvalidResponse("empty reply".to_string()));
    }
    Ok(content.to_string())
}

fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    let text = text.strip_suffix('"').unwrap_or(text);
    let text = text.strip_prefix('\'').unwrap_or(text);
    let text = text.strip_suffix('\'').unwrap_or(text);
    text.trim()
}

impl TranslationBackend for AiBackend {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn is_available(&self) -> bool {
        !self.disabled.load(Ordering::Relaxed)
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        _from: &'a str,
        to: &'a str,
    ) -> BoxFuture<'a, TranslationResult<String>> {
        self.request(text, to).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_google_reply_joins_fragments() {
        let data = json!([[["Olá. ", "Hello. ", null], ["Mundo", "World", null]], null, "en"]);
        assert_eq!(parse_google_reply(&data).unwrap(), "Olá. Mundo");
        assert!(parse_google_reply(&json!({"error": 1})).is_err());
    }

    #[test]
    fn test_parse_ai_reply() {
        let ok = json!({"choices": [{"message": {"content": " \"Olá mundo\" "}}]});
        assert_eq!(parse_ai_reply(&ok).unwrap(), "Olá mundo");

        let chatter = json!({"choices": [{"message": {"content": "Claro! Aqui vai"}}]});
        assert!(matches!(
            parse_ai_reply(&chatter),
            Err(TranslationError::InvalidResponse(_))
        ));

        let quota = json!({"error": {"message": "You exceeded your current quota"}});
        assert!(matches!(
            parse_ai_reply(&quota),
            Err(TranslationError::QuotaExceeded(_))
        ));
    }

    #[test]
    fn test_ai_model_defaults_when_blank() {
        let backend = AiBackend::new(reqwest::Client::new(), constants::DEFAULT_AI_URL, " ", "key");
        assert_eq!(backend.model(), "gpt-3.5-turbo");
        assert!(backend.is_available());
    }
}
