//! Process-wide request metrics.
//!
//! [`MetricsAggregator`] accumulates totals and per-model breakdowns for
//! every routed request, successful or not. All state sits behind a single
//! mutex so a [`MetricsSnapshot`] is always a consistent point-in-time view:
//! a reader never sees a request counted without its tokens and cost.
//!
//! Each observation is also forwarded to the `metrics` facade (see
//! [`telemetry`](crate::telemetry)) for consumers with an exporter installed.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::cost::round_to;
use crate::telemetry;

/// Per-model key for requests naming a model outside the catalog.
///
/// Callers choose the model string, so failures for unknown names share one
/// bucket instead of growing the per-model maps without bound.
pub const UNLISTED_MODEL: &str = "(unlisted)";

/// One routed request, as seen by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub model: String,
    pub tokens: u64,
    pub cost_usd: f64,
    pub latency_ms: f64,
    pub cached: bool,
    pub error: bool,
}

impl Observation {
    /// A successful request.
    pub fn success(
        model: impl Into<String>,
        tokens: u64,
        cost_usd: f64,
        latency_ms: f64,
        cached: bool,
    ) -> Self {
        Self {
            model: model.into(),
            tokens,
            cost_usd,
            latency_ms,
            cached,
            error: false,
        }
    }

    /// A failed request: zero tokens and cost, observed latency.
    pub fn failure(model: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            model: model.into(),
            tokens: 0,
            cost_usd: 0.0,
            latency_ms,
            cached: false,
            error: true,
        }
    }
}

/// Aggregate counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub cache_hits: u64,
    /// `cache_hits / total_requests * 100`, rounded to 2 places.
    pub cache_hit_rate_percent: f64,
    /// `latency_sum / total_requests`, rounded to 2 places. Includes failures.
    pub average_latency_ms: f64,
    pub requests_by_model: BTreeMap<String, u64>,
    pub tokens_by_model: BTreeMap<String, u64>,
    pub cost_by_model: BTreeMap<String, f64>,
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    failed_requests: u64,
    total_tokens: u64,
    total_cost_usd: f64,
    cache_hits: u64,
    latency_sum_ms: f64,
    requests_by_model: BTreeMap<String, u64>,
    tokens_by_model: BTreeMap<String, u64>,
    cost_by_model: BTreeMap<String, f64>,
}

/// Thread-safe request metrics, shared by every concurrent `route` call.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    counters: Mutex<Counters>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave counters half-written
    // (each update is plain arithmetic), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one request. All fields are applied under a single lock.
    pub fn record(&self, obs: &Observation) {
        {
            let mut c = self.lock();
            c.total_requests += 1;
            c.total_tokens += obs.tokens;
            c.total_cost_usd += obs.cost_usd;
            c.latency_sum_ms += obs.latency_ms;
            if obs.error {
                c.failed_requests += 1;
            }
            if obs.cached {
                c.cache_hits += 1;
            }
            *c.requests_by_model.entry(obs.model.clone()).or_default() += 1;
            *c.tokens_by_model.entry(obs.model.clone()).or_default() += obs.tokens;
            *c.cost_by_model.entry(obs.model.clone()).or_default() += obs.cost_usd;
        }

        Self::emit(obs);
    }

    fn emit(obs: &Observation) {
        let status = if obs.error { "error" } else { "ok" };
        let cached = if obs.cached { "true" } else { "false" };
        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "model" => obs.model.clone(),
            "status" => status,
            "cached" => cached
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "model" => obs.model.clone())
            .record(obs.latency_ms / 1000.0);
        if !obs.error {
            metrics::counter!(telemetry::TOKENS_TOTAL, "model" => obs.model.clone())
                .increment(obs.tokens);
            metrics::gauge!(telemetry::COST_USD_TOTAL, "model" => obs.model.clone())
                .increment(obs.cost_usd);
        }
    }

    /// Consistent snapshot of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.lock();
        let (cache_hit_rate_percent, average_latency_ms) = if c.total_requests == 0 {
            (0.0, 0.0)
        } else {
            let total = c.total_requests as f64;
            (
                round_to(c.cache_hits as f64 / total * 100.0, 2),
                round_to(c.latency_sum_ms / total, 2),
            )
        };

        MetricsSnapshot {
            total_requests: c.total_requests,
            successful_requests: c.total_requests - c.failed_requests,
            failed_requests: c.failed_requests,
            total_tokens: c.total_tokens,
            total_cost_usd: round_to(c.total_cost_usd, 6),
            cache_hits: c.cache_hits,
            cache_hit_rate_percent,
            average_latency_ms,
            requests_by_model: c.requests_by_model.clone(),
            tokens_by_model: c.tokens_by_model.clone(),
            cost_by_model: c
                .cost_by_model
                .iter()
                .map(|(model, cost)| (model.clone(), round_to(*cost, 6)))
                .collect(),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        *self.lock() = Counters::default();
    }
}
