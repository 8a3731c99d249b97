//! Model descriptor type.

use serde::{Deserialize, Serialize};

/// Capability and pricing metadata for one catalog entry.
///
/// Immutable once loaded; the [`ModelCatalog`](crate::catalog::ModelCatalog)
/// owns every descriptor and hands out shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Short name callers use (e.g. "nova-pro"). Unique within a catalog.
    pub name: String,
    /// Provider-side identifier (e.g. "us.amazon.nova-pro-v1:0").
    pub model_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Maximum context window in tokens.
    pub context_window: u32,
    /// USD per 1,000 input tokens.
    pub input_cost_per_1k: f64,
    /// USD per 1,000 output tokens.
    pub output_cost_per_1k: f64,
    /// Whether the backend accepts a dedicated system prompt.
    #[serde(default = "default_supports_system")]
    pub supports_system: bool,
    /// Upper bound applied to every request's `max_tokens`.
    pub max_output_tokens: u32,
}

fn default_supports_system() -> bool {
    true
}

impl ModelDescriptor {
    /// Create a descriptor with required fields; optional fields default.
    pub fn new(name: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            display_name: String::new(),
            description: String::new(),
            context_window: 0,
            input_cost_per_1k: 0.0,
            output_cost_per_1k: 0.0,
            supports_system: true,
            max_output_tokens: 4096,
        }
    }

    /// Set per-1k-token prices (input, output).
    pub fn with_pricing(mut self, input_cost_per_1k: f64, output_cost_per_1k: f64) -> Self {
        self.input_cost_per_1k = input_cost_per_1k;
        self.output_cost_per_1k = output_cost_per_1k;
        self
    }

    /// Set the context window size.
    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    /// Set the output token ceiling.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Mark whether the backend supports a system role.
    pub fn with_system_support(mut self, supported: bool) -> Self {
        self.supports_system = supported;
        self
    }

    /// Set display name and description.
    pub fn with_description(
        mut self,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.display_name = display_name.into();
        self.description = description.into();
        self
    }
}
