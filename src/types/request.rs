//! Generation request type

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::Result;

/// Sampling temperature used when the caller does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Output token limit used when the caller does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// A provider-neutral completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Catalog short name (e.g. "nova-lite").
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl GenerationRequest {
    /// Create a request with the default temperature and token limit.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Decode an untyped request (as received by a transport).
    ///
    /// Reports the specific structural problem as `InvalidRequest` instead of
    /// a generic deserialization error, then applies the same range checks
    /// as [`validate()`](crate::validation::validate).
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        crate::validation::decode_request(value)
    }
}
