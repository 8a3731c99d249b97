//! Telemetry metric name constants.
//!
//! Centralised metric names for hermod operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops. The in-process
//! [`MetricsAggregator`](crate::stats::MetricsAggregator) is fed the same
//! events and is always available through
//! [`Router::stats()`](crate::Router::stats).
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hermod_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `model`: catalog short name (e.g. "nova-lite")
//! - `status`: outcome: "ok" or "error"
//! - `cached`: whether the response came from the cache: "true" | "false"

/// Total requests routed through the gateway.
///
/// Labels: `model`, `status` ("ok" | "error"), `cached`.
pub const REQUESTS_TOTAL: &str = "hermod_requests_total";

/// Request duration in seconds, measured from receipt to response.
///
/// Labels: `model`.
pub const REQUEST_DURATION_SECONDS: &str = "hermod_request_duration_seconds";

/// Total tokens accounted to successful requests.
///
/// Labels: `model`.
pub const TOKENS_TOTAL: &str = "hermod_tokens_total";

/// Estimated spend in USD.
///
/// Labels: `model`.
pub const COST_USD_TOTAL: &str = "hermod_cost_usd_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "hermod_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "hermod_cache_misses_total";
