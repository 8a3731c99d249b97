//! Provider adapter: the boundary between canonical and provider shapes.
//!
//! The adapter owns every provider-facing decision the router should not
//! know about: converting messages (including the system-role merge),
//! clamping `max_tokens` to the model's ceiling, bounding the call with a
//! timeout, and normalizing whatever came back into one
//! [`GenerationResult`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use super::convert::to_converse_messages;
use super::traits::{ConverseMessage, ConverseReply, ConverseRequest, ModelProvider};
use crate::types::{GenerationResult, Message, ModelDescriptor, Usage};
use crate::{HermodError, Result};

/// Default upper bound on one provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Finish reason reported when the backend gives none.
pub const DEFAULT_FINISH_REASON: &str = "stop";

/// Wraps a [`ModelProvider`] with conversion, clamping, timeout and
/// normalization.
#[derive(Clone)]
pub struct ProviderAdapter {
    provider: Arc<dyn ModelProvider>,
    timeout: Duration,
}

impl ProviderAdapter {
    /// Adapter with the [`DEFAULT_TIMEOUT`].
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_timeout(provider, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(provider: Arc<dyn ModelProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Name of the wrapped provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert canonical messages for `model`.
    ///
    /// See [`to_converse_messages()`] for the system-role rules.
    pub fn convert(
        messages: &[Message],
        supports_system: bool,
    ) -> (Option<String>, Vec<ConverseMessage>) {
        to_converse_messages(messages, supports_system)
    }

    /// Convert and generate in one step.
    pub async fn complete(
        &self,
        model: &ModelDescriptor,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<GenerationResult> {
        let (system_prompt, conversation) = Self::convert(messages, model.supports_system);
        self.generate(model, conversation, system_prompt, temperature, max_tokens)
            .await
    }

    /// Call the provider and normalize its reply.
    ///
    /// `max_tokens` is clamped to `model.max_output_tokens`. A system prompt
    /// is only forwarded to models that support one. Fails with
    /// `Timeout` when the call outlives the adapter timeout, `EmptyResponse`
    /// when no text came back, or the provider's own error.
    #[instrument(
        skip(self, model, conversation, system_prompt),
        fields(provider = self.provider.name(), model = %model.name, model_id = %model.model_id)
    )]
    pub async fn generate(
        &self,
        model: &ModelDescriptor,
        conversation: Vec<ConverseMessage>,
        system_prompt: Option<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<GenerationResult> {
        let request = ConverseRequest {
            model_id: model.model_id.clone(),
            messages: conversation,
            system: system_prompt.filter(|_| model.supports_system),
            temperature,
            max_tokens: max_tokens.min(model.max_output_tokens),
        };
        debug!(
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            has_system = request.system.is_some(),
            "calling provider"
        );

        let reply = tokio::time::timeout(self.timeout, self.provider.converse(&request))
            .await
            .map_err(|_| HermodError::Timeout(self.timeout))??;

        normalize(reply, &model.name)
    }
}

/// Turn a raw reply into the canonical result.
///
/// Missing counters default to zero, a missing total is `input + output`,
/// and a missing stop reason is [`DEFAULT_FINISH_REASON`].
pub fn normalize(reply: ConverseReply, model_name: &str) -> Result<GenerationResult> {
    let content = reply
        .content
        .filter(|c| !c.is_empty())
        .ok_or(HermodError::EmptyResponse)?;

    let raw = reply.usage.unwrap_or_default();
    let input_tokens = raw.input_tokens.unwrap_or(0);
    let output_tokens = raw.output_tokens.unwrap_or(0);
    let usage = Usage {
        input_tokens,
        output_tokens,
        total_tokens: raw
            .total_tokens
            .unwrap_or_else(|| input_tokens.saturating_add(output_tokens)),
    };

    Ok(GenerationResult {
        content,
        usage,
        finish_reason: reply
            .stop_reason
            .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
        model: model_name.to_string(),
    })
}
