//! Error types shared across the data layer.
//!
//! Errors are `Clone`: one failed request is delivered to every resource that shares it.

use thiserror::Error;

/// Failure of a single GET against the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network unreachable, connection reset, TLS failure and the like.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx response; carries the raw body text.
    #[error("API Error: {status} - {body}")]
    Status { status: u16, body: String },
    /// 2xx response whose body is not the expected JSON.
    #[error("invalid JSON payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(_) | FetchError::Decode(_) => None,
        }
    }

    /// Whether the retry policy applies. Every failure is retried; 4xx is not special-cased.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// A lazy module import rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load module {identity}: {message}")]
pub struct ModuleLoadError {
    pub identity: String,
    pub message: String,
}

impl ModuleLoadError {
    pub fn new(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            message: message.into(),
        }
    }
}
