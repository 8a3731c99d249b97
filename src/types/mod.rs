//! Public types for the Hermod API.

mod message;
mod model;
mod request;
mod response;

pub use message::{Message, Role};
pub use model::ModelDescriptor;
pub use request::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationRequest};
pub use response::{EnrichedResponse, GenerationResult, Usage};
