//! Caching subsystem.
//!
//! - [`response::ResponseCache`]: LRU + TTL cache of generation results,
//!   keyed on an exact request [`fingerprint`]. On by default; configured
//!   through the builder's `.response_cache()` or turned off with
//!   `.disable_response_cache()`.

pub mod response;

pub use response::{CacheConfig, CacheStats, ResponseCache, fingerprint};
