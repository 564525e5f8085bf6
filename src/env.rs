//! Typed environment variables
//!
//! Every variable the crate reads is declared here once, with its default,
//! a description and a validating parser.

use std::env;
use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {variable}: {message}")]
    Invalid {
        variable: &'static str,
        message: String,
    },
}

pub type EnvResult<T> = Result<T, EnvError>;

fn invalid<T>(variable: &'static str, message: impl Into<String>) -> EnvResult<T> {
    Err(EnvError::Invalid {
        variable,
        message: message.into(),
    })
}

/// Accessor for one environment variable
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// Value used when the variable is unset
    fn default_value() -> Option<T> {
        None
    }

    fn get() -> EnvResult<T> {
        match Self::get_set()? {
            Some(value) => Ok(value),
            None => Self::default_value().ok_or(EnvError::Missing(Self::NAME)),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// `Ok(None)` when unset, the parsed value or the parse error otherwise
    fn get_set() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// One line of the generated variable listing
#[derive(Debug, Clone)]
pub struct EnvDoc {
    pub name: &'static str,
    pub description: &'static str,
    pub default: Option<String>,
}

fn describe<T: Debug, V: EnvVar<T>>() -> EnvDoc {
    EnvDoc {
        name: V::NAME,
        description: V::DESCRIPTION,
        default: V::default_value().map(|value| format!("{value:?}")),
    }
}

macro_rules! env_var {
    (
        $(#[$meta:meta])*
        $ident:ident: $ty:ty = $name:literal,
        $description:literal,
        parse: $parse:expr
        $(, default: $default:expr)?
    ) => {
        $(#[$meta])*
        pub struct $ident;

        impl EnvVar<$ty> for $ident {
            const NAME: &'static str = $name;
            const DESCRIPTION: &'static str = $description;

            fn parse(value: &str) -> EnvResult<$ty> {
                ($parse)(Self::NAME, value)
            }

            $(
                fn default_value() -> Option<$ty> {
                    Some($default)
                }
            )?
        }
    };
}

/// Core variables
pub mod core {
    use super::*;

    env_var! {
        /// Log level of the CLI subscriber
        LogLevel: String = "TEXTPATCH_LOG_LEVEL",
        "Log level: trace, debug, info, warn, error",
        parse: parse_log_level,
        default: "info".to_string()
    }

    env_var! {
        /// Disable colored log output
        NoColor: bool = "NO_COLOR",
        "Disable colored output when set to any value",
        parse: |_, value: &str| Ok::<_, EnvError>(!value.is_empty()),
        default: false
    }

    env_var! {
        /// Explicit configuration file
        ConfigPath: String = "TEXTPATCH_CONFIG",
        "Path of the TOML configuration file",
        parse: non_empty
    }

    env_var! {
        /// Directory holding dictionary and preference slots
        StateDir: String = "TEXTPATCH_STATE_DIR",
        "Directory for the persisted dictionary and preferences",
        parse: non_empty
    }

    fn parse_log_level(variable: &'static str, value: &str) -> EnvResult<String> {
        let level = value.trim().to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
            _ => invalid(
                variable,
                format!("unknown log level '{value}', expected trace, debug, info, warn or error"),
            ),
        }
    }

    pub(super) fn docs() -> Vec<EnvDoc> {
        vec![
            describe::<_, LogLevel>(),
            describe::<_, NoColor>(),
            describe::<_, ConfigPath>(),
            describe::<_, StateDir>(),
        ]
    }
}

/// Translation variables
pub mod translation {
    use super::*;

    env_var! {
        /// Target language
        TargetLang: String = "TEXTPATCH_TARGET_LANG",
        "Target language for translation (ISO 639-1 code)",
        parse: |variable, value| parse_lang(variable, value, false),
        default: "pt".to_string()
    }

    env_var! {
        /// Source language
        SourceLang: String = "TEXTPATCH_SOURCE_LANG",
        "Source language for translation ('auto' for detection)",
        parse: |variable, value| parse_lang(variable, value, true),
        default: "auto".to_string()
    }

    env_var! {
        /// Preferred translation provider
        Provider: String = "TEXTPATCH_PROVIDER",
        "Translation provider: auto, google, mymemory, ai",
        parse: parse_provider
    }

    env_var! {
        /// Key of the chat-completion API
        AiKey: String = "TEXTPATCH_AI_KEY",
        "API key enabling the AI translation engine",
        parse: parse_key
    }

    env_var! {
        /// Chat-completion model
        AiModel: String = "TEXTPATCH_AI_MODEL",
        "Model used by the AI translation engine",
        parse: non_empty
    }

    env_var! {
        /// Request timeout
        Timeout: Duration = "TEXTPATCH_TIMEOUT_SECS",
        "Translation request timeout in seconds",
        parse: parse_timeout,
        default: crate::config::constants::DEFAULT_TIMEOUT
    }

    fn parse_provider(variable: &'static str, value: &str) -> EnvResult<String> {
        let provider = value.trim().to_lowercase();
        match provider.as_str() {
            "auto" | "google" | "mymemory" | "ai" => Ok(provider),
            _ => invalid(
                variable,
                format!("unknown provider '{value}', expected auto, google, mymemory or ai"),
            ),
        }
    }

    fn parse_key(variable: &'static str, value: &str) -> EnvResult<String> {
        let key = value.trim();
        if key.len() < 8 {
            return invalid(variable, "API key must be at least 8 characters");
        }
        Ok(key.to_string())
    }

    // 1..=300 seconds
    fn parse_timeout(variable: &'static str, value: &str) -> EnvResult<Duration> {
        match value.trim().parse::<u64>() {
            Ok(0) => invalid(variable, "timeout must be greater than 0"),
            Ok(seconds) if seconds > 300 => invalid(variable, "timeout too long (max 300 seconds)"),
            Ok(seconds) => Ok(Duration::from_secs(seconds)),
            Err(_) => invalid(variable, format!("'{value}' is not a number of seconds")),
        }
    }

    pub(super) fn docs() -> Vec<EnvDoc> {
        vec![
            describe::<_, TargetLang>(),
            describe::<_, SourceLang>(),
            describe::<_, Provider>(),
            describe::<_, AiKey>(),
            describe::<_, AiModel>(),
            describe::<_, Timeout>(),
        ]
    }
}

fn non_empty(variable: &'static str, value: &str) -> EnvResult<String> {
    match value.trim() {
        "" => invalid(variable, "value cannot be empty"),
        trimmed => Ok(trimmed.to_string()),
    }
}

fn parse_lang(variable: &'static str, value: &str, allow_auto: bool) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    let plain = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_lowercase());
    // pt-br, zh-cn
    let regional = lang
        .split_once('-')
        .is_some_and(|(base, region)| base.len() == 2 && (2..=4).contains(&region.len()));

    if (allow_auto && lang == "auto") || plain || regional {
        Ok(lang)
    } else {
        invalid(variable, format!("invalid language code '{value}'"))
    }
}

/// Markdown listing of every variable
pub fn generate_env_docs() -> String {
    let sections = [("Core", core::docs()), ("Translation", translation::docs())];

    let mut docs = String::from("# Environment Variables\n");
    for (title, vars) in sections {
        docs.push_str(&format!("\n## {title}\n\n"));
        for var in vars {
            match var.default {
                Some(default) => docs.push_str(&format!(
                    "- `{}`: {} (default: {})\n",
                    var.name, var.description, default
                )),
                None => docs.push_str(&format!("- `{}`: {}\n", var.name, var.description)),
            }
        }
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(matches!(
            core::LogLevel::parse("loud"),
            Err(EnvError::Invalid { variable: "TEXTPATCH_LOG_LEVEL", .. })
        ));
    }

    #[test]
    fn test_lang_parse() {
        assert_eq!(translation::TargetLang::parse(" PT ").unwrap(), "pt");
        assert_eq!(translation::TargetLang::parse("pt-BR").unwrap(), "pt-br");
        assert!(translation::TargetLang::parse("auto").is_err());
        assert_eq!(translation::SourceLang::parse("auto").unwrap(), "auto");
        assert!(translation::SourceLang::parse("english").is_err());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(translation::Provider::parse("MyMemory").unwrap(), "mymemory");
        assert!(translation::Provider::parse("deepl").is_err());
    }

    #[test]
    fn test_timeout_parse() {
        assert_eq!(
            translation::Timeout::parse("15").unwrap(),
            Duration::from_secs(15)
        );
        assert!(translation::Timeout::parse("0").is_err());
        assert!(translation::Timeout::parse("301").is_err());
        assert!(translation::Timeout::parse("soon").is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(core::LogLevel::default_value().as_deref(), Some("info"));
        assert_eq!(translation::AiKey::default_value(), None);
    }

    #[test]
    fn test_env_docs_lists_variables() {
        let docs = generate_env_docs();
        assert!(docs.contains("## Translation"));
        assert!(docs.contains("`TEXTPATCH_TARGET_LANG`"));
        assert!(docs.contains("(default: \"pt\")"));
        assert!(docs.contains("TEXTPATCH_AI_KEY"));
    }
}
