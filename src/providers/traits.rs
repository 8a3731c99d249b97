//! The model-provider contract.
//!
//! A [`ModelProvider`] is the only thing in hermod that talks to a remote
//! foundation-model backend. Its contract is deliberately narrow: given a
//! provider-shaped conversation and generation parameters, return whatever
//! the backend produced (text, usage, stop reason) or fail. Everything
//! else (system-role handling, clamping, defaults, emptiness checks) is the
//! [`ProviderAdapter`](super::ProviderAdapter)'s job, so provider
//! implementations stay thin and replies stay raw.
//!
//! # Errors
//!
//! Implementations report upstream and transport failures as
//! [`HermodError::Provider`](crate::HermodError::Provider) with the upstream
//! error code and message. They need not enforce a timeout; the adapter does.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use hermod::Result;
//! use hermod::providers::{ConverseReply, ConverseRequest, ModelProvider, ReplyUsage};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ModelProvider for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply> {
//!         let last = request.messages.last().map(|m| m.content.clone());
//!         Ok(ConverseReply {
//!             content: last,
//!             usage: Some(ReplyUsage::new(1, 1)),
//!             stop_reason: None,
//!         })
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Conversation roles a provider accepts. System text travels separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverseRole {
    User,
    Assistant,
}

/// One turn of a provider-shaped conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverseMessage {
    pub role: ConverseRole,
    pub content: String,
}

impl ConverseMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConverseRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ConverseRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a provider needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseRequest {
    /// Provider-side model identifier.
    pub model_id: String,
    pub messages: Vec<ConverseMessage>,
    /// Dedicated system prompt; only set for models that support one.
    pub system: Option<String>,
    pub temperature: f64,
    /// Already clamped to the model's output ceiling.
    pub max_tokens: u32,
}

/// Token counters as reported by the backend. Any may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl ReplyUsage {
    /// Input and output counts, without a reported total.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            total_tokens: None,
        }
    }
}

/// A raw backend reply, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverseReply {
    /// Generated text; `None` when the backend produced no text blocks.
    pub content: Option<String>,
    pub usage: Option<ReplyUsage>,
    pub stop_reason: Option<String>,
}

/// A remote foundation-model backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Run one conversation turn.
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply>;
}
