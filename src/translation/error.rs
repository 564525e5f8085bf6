//! Translation backend errors
//!
//! A `TranslationError` never leaves the fallback chain: each one makes the
//! chain move on to the next engine, and exhausting the chain leaves the
//! text untranslated.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Connection, DNS, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// The reply could not be understood, or broke the expected format
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The engine echoed the input back
    #[error("engine returned the text unchanged")]
    Unchanged,

    /// Free-tier limit or billing problem on the engine side
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The run was cancelled before this request completed
    #[error("translation cancelled")]
    Cancelled,

    /// Every engine in the chain failed
    #[error("all translation engines failed")]
    Exhausted,
}

impl TranslationError {
    /// Whether the same engine may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Network(_) => true,
            TranslationError::Http { status } => *status == 429 || *status >= 500,
            TranslationError::InvalidResponse(_) => true,
            TranslationError::Unchanged => false,
            TranslationError::QuotaExceeded(_) => false,
            TranslationError::Cancelled => false,
            TranslationError::Exhausted => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::Network(_) => ErrorSeverity::Warning,
            TranslationError::Http { .. } => ErrorSeverity::Warning,
            TranslationError::InvalidResponse(_) => ErrorSeverity::Warning,
            TranslationError::Unchanged => ErrorSeverity::Info,
            TranslationError::QuotaExceeded(_) => ErrorSeverity::Error,
            TranslationError::Cancelled => ErrorSeverity::Info,
            TranslationError::Exhausted => ErrorSeverity::Error,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::Network(_) | TranslationError::Http { .. } => ErrorCategory::Network,
            TranslationError::InvalidResponse(_) | TranslationError::Unchanged => {
                ErrorCategory::Response
            }
            TranslationError::QuotaExceeded(_) => ErrorCategory::Quota,
            TranslationError::Cancelled => ErrorCategory::Cancellation,
            TranslationError::Exhausted => ErrorCategory::Service,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Response,
    Quota,
    Cancellation,
    Service,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TranslationError::Http {
                status: status.as_u16(),
            },
            None if error.is_decode() => TranslationError::InvalidResponse(error.to_string()),
            None => TranslationError::Network(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::InvalidResponse(error.to_string())
    }
}

pub type TranslationResult<T> = Result<T, TranslationError>;
