//! Domain-level error types for slack-history-export.
//!
//! All errors are typed with `thiserror`. Rate limiting is its own variant
//! because it is the only failure the fetch loops recover from.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The API asked us to slow down (HTTP 429 or `ratelimited`).
    #[error("{method} rate-limited (retry after {retry_after:?}s)")]
    RateLimited {
        method: String,
        retry_after: Option<u64>,
    },

    /// The API answered with `ok: false`.
    #[error("{method} failed: {error}")]
    Api { method: String, error: String },

    /// Non-success HTTP status other than 429.
    #[error("{method} returned HTTP {status}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create an HTTP transport error from a reqwest error.
    pub fn http(err: reqwest::Error) -> Self {
        Self::Http {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Whether this error is a rate-limit signal worth retrying.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-provided wait in seconds, if this is a rate-limit error that carried one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
