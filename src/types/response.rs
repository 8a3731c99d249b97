//! Canonical response types

use serde::{Deserialize, Serialize};

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Usage with `total_tokens` derived from the two directions.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Provider-independent generation result.
///
/// Produced only by the [`ProviderAdapter`](crate::providers::ProviderAdapter);
/// this is also what the response cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub usage: Usage,
    pub finish_reason: String,
    /// Catalog short name the result was generated for.
    pub model: String,
}

/// What the router hands back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResponse {
    #[serde(flatten)]
    pub result: GenerationResult,
    pub cached: bool,
    /// Milliseconds from receipt to response, rounded to 2 places.
    pub latency_ms: f64,
    /// Estimated spend, rounded to 6 places.
    pub estimated_cost_usd: f64,
}

impl std::ops::Deref for EnrichedResponse {
    type Target = GenerationResult;

    fn deref(&self) -> &Self::Target {
        &self.result
    }
}
