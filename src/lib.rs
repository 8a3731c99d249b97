//! Hermod - cost-aware completion gateway for foundation models
//!
//! Hermod sits between callers and a foundation-model provider (Amazon
//! Bedrock by default). Every request goes through one [`Router`], which:
//!
//! - validates the request and resolves the model name against a
//!   [`ModelCatalog`](catalog::ModelCatalog);
//! - answers exact repeats from an LRU + TTL response cache;
//! - adapts messages to the model (system-role merge, output ceiling) and
//!   calls the provider with a timeout;
//! - estimates the USD cost from actual token usage;
//! - records per-model metrics for every request, failed ones included.
//!
//! # Example
//!
//! ```rust,no_run
//! use hermod::{Hermod, Message};
//!
//! #[tokio::main]
//! async fn main() -> hermod::Result<()> {
//!     let router = Hermod::builder()
//!         .bedrock("us-east-1", "bedrock-api-key")
//!         .build()?;
//!
//!     let response = router
//!         .route(
//!             "nova-lite",
//!             &[
//!                 Message::system("You are a terse assistant."),
//!                 Message::user("What is the capital of France?"),
//!             ],
//!             0.7,
//!             200,
//!         )
//!         .await?;
//!
//!     println!("{}", response.content);
//!     println!("cost: ${:.6}", response.estimated_cost_usd);
//!     println!("{:#?}", router.stats());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod stats;
pub mod telemetry;
pub mod types;
pub mod validation;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStats, ResponseCache};
pub use catalog::ModelCatalog;
pub use config::{Config, Secrets};
pub use error::{HermodError, Result};
pub use gateway::{GatewayStats, Hermod, HermodBuilder, Router};
pub use providers::{BedrockClient, BedrockSdkClient, ModelProvider, ProviderAdapter};
pub use stats::{MetricsAggregator, MetricsSnapshot};
pub use types::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, EnrichedResponse, GenerationRequest,
    GenerationResult, Message, ModelDescriptor, Role, Usage,
};
pub use version::PKG_VERSION;
