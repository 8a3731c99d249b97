//! Model providers and the adapter in front of them.
//!
//! [`ModelProvider`] is the seam to a remote backend. [`BedrockSdkClient`]
//! (IAM, AWS SDK) and [`BedrockClient`] (API key, plain HTTPS) are the
//! production implementations. [`ProviderAdapter`] wraps any provider with
//! message conversion, output-ceiling clamping, a timeout and reply
//! normalization.

pub mod adapter;
pub mod bedrock;
pub mod bedrock_sdk;
pub mod convert;
pub mod traits;

pub use adapter::{DEFAULT_TIMEOUT, ProviderAdapter};
pub use bedrock::BedrockClient;
pub use bedrock_sdk::BedrockSdkClient;
pub use convert::to_converse_messages;
pub use traits::{
    ConverseMessage, ConverseReply, ConverseRequest, ConverseRole, ModelProvider, ReplyUsage,
};
