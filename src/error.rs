//! Hermod error types

use std::time::Duration;

/// Hermod error types
#[derive(Debug, thiserror::Error)]
pub enum HermodError {
    // Caller errors
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model '{model}' not found. Available models: {}", available.join(", "))]
    UnknownModel {
        model: String,
        available: Vec<String>,
    },

    // Upstream errors
    #[error("provider error ({code}): {message}")]
    Provider { code: String, message: String },

    #[error("empty response from model")]
    EmptyResponse,

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Router-level wrapper around a provider failure, so callers can tell
    /// local validation failures apart from upstream ones.
    #[error("failed to generate response: {0}")]
    GenerationFailed(#[source] Box<HermodError>),

    // Startup errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HermodError {
    /// Build a provider error from an upstream code and message.
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error originated at (or while waiting on) the model provider.
    ///
    /// `GenerationFailed` is classified by its inner error.
    pub fn is_provider_error(&self) -> bool {
        match self {
            Self::Provider { .. } | Self::EmptyResponse | Self::Timeout(_) => true,
            Self::GenerationFailed(inner) => inner.is_provider_error(),
            _ => false,
        }
    }

    /// Whether the caller sent something the gateway rejects locally.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::UnknownModel { .. })
    }
}

/// Result type alias for Hermod operations
pub type Result<T> = std::result::Result<T, HermodError>;
