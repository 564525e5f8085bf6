//! Configuration
//!
//! `AppConfig` comes from an optional TOML file, then environment overrides,
//! then defaults.

pub mod manager;

pub use manager::{AppConfig, ConfigManager, Provider};

/// Configuration constants
pub mod constants {
    use std::time::Duration;

    // Languages
    pub const DEFAULT_SOURCE_LANG: &str = "auto";
    pub const DEFAULT_TARGET_LANG: &str = "pt";

    // Engines
    pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
    pub const DEFAULT_AI_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_GOOGLE_URL: &str = "https://translate.googleapis.com/translate_a/single";
    pub const DEFAULT_MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    // Processing
    pub const DEFAULT_BATCH_SIZE: usize = 200;
    pub const DEFAULT_CACHE_SIZE: usize = 1000;
    /// MyMemory only looks at this many characters when detecting a language
    pub const LANGUAGE_DETECTION_SAMPLE: usize = 400;

    // Values that are code, not prose; matched only when all lowercase
    pub const RESERVED_CODE_TERMS: &[&str] = &[
        "if", "else", "for", "while", "return", "var", "let", "const", "function", "true",
        "false", "null", "undefined", "import", "export", "class", "this", "console", "log",
        "print", "input", "exit", "require",
    ];

    // UI identifiers and property names, matched ignoring case
    pub const RESERVED_MIXED_TERMS: &[&str] = &[
        "main", "Linear", "VCenter", "Horizontal", "Outlined", "Primary", "favorite", "parent",
        "options", "titles", "width", "height", "items", "texts", "index", "expand", "expandIcon",
        "titleWidth", "secondaryText", "String", "Number", "Boolean", "Object", "List",
        "absHeight", "absLeft", "absTop", "absWidth", "backColor", "backImage", "border",
        "borderColor", "borderStyle", "cornerRadius", "disabled", "el", "fontFile", "isVisible",
        "itemPadding", "left", "margins", "opacity", "padding", "position", "rotation", "rounded",
        "textColor", "textSize", "addClass", "animate", "bringForward", "destroy", "gone", "hide",
        "popItem", "removeItemByIndex", "removeItemByName", "sendBackward", "addItem",
        "getEnabled", "getLayout", "setBorder", "setEnabled", "addButton", "addText",
        "addTextField", "showPopup", "onStart", "onTouch", "layout",
    ];

    // Configuration file search paths, after --config and $TEXTPATCH_CONFIG
    pub const CONFIG_PATHS: &[&str] = &["textpatch.toml", "~/.config/textpatch/config.toml"];

    // .env files, first existing wins
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}
