//! Request routing: validate, resolve, cache, generate, account.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, ResponseCache};
use crate::catalog::ModelCatalog;
use crate::cost::{self, round_to};
use crate::providers::ProviderAdapter;
use crate::stats::{MetricsAggregator, MetricsSnapshot, Observation, UNLISTED_MODEL};
use crate::types::{EnrichedResponse, GenerationRequest, GenerationResult, Message, ModelDescriptor};
use crate::validation;
use crate::{HermodError, Result};

/// Point-in-time gateway statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayStats {
    pub metrics: MetricsSnapshot,
    pub cache: CacheStats,
}

/// The gateway's single entry point for completions.
///
/// Cheap to clone; clones share the catalog, cache and metrics. Build one
/// with [`Hermod::builder()`](crate::Hermod::builder).
#[derive(Clone)]
pub struct Router {
    catalog: Arc<ModelCatalog>,
    cache: Option<Arc<ResponseCache>>,
    metrics: Arc<MetricsAggregator>,
    adapter: ProviderAdapter,
}

impl Router {
    pub(crate) fn new(
        catalog: Arc<ModelCatalog>,
        cache: Option<Arc<ResponseCache>>,
        metrics: Arc<MetricsAggregator>,
        adapter: ProviderAdapter,
    ) -> Self {
        Self {
            catalog,
            cache,
            metrics,
            adapter,
        }
    }

    /// Route one completion request.
    ///
    /// Every call, successful or not, is recorded in the metrics. Local
    /// rejections come back as `InvalidRequest` or `UnknownModel`; anything
    /// that went wrong at the provider is wrapped in `GenerationFailed`.
    #[instrument(
        skip(self, messages),
        fields(messages = messages.len())
    )]
    pub async fn route(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<EnrichedResponse> {
        let start = Instant::now();

        let checked = validation::validate_messages(messages)
            .and_then(|()| validation::validate_temperature(temperature))
            .and_then(|()| validation::validate_max_tokens(max_tokens));
        if let Err(e) = checked {
            return Err(self.fail(model, start, e));
        }

        let descriptor = match self.catalog.lookup(model) {
            Ok(d) => d,
            Err(e) => return Err(self.fail(model, start, e)),
        };

        let (result, cached) = match self.cached(model, messages, temperature, max_tokens) {
            Some(hit) => {
                debug!("cache hit");
                (hit, true)
            }
            None => {
                let generated = self
                    .adapter
                    .complete(descriptor, messages, temperature, max_tokens)
                    .await;
                match generated {
                    Ok(result) => {
                        if let Some(cache) = &self.cache {
                            cache.put(model, messages, temperature, max_tokens, result.clone());
                        }
                        (result, false)
                    }
                    Err(e) => {
                        return Err(self.fail(
                            model,
                            start,
                            HermodError::GenerationFailed(Box::new(e)),
                        ));
                    }
                }
            }
        };

        let cost_usd = cost::estimate(
            descriptor,
            result.usage.input_tokens,
            result.usage.output_tokens,
        );
        let latency_ms = elapsed_ms(start);
        let tokens = u64::from(result.usage.total_tokens);

        self.metrics.record(&Observation::success(
            model, tokens, cost_usd, latency_ms, cached,
        ));
        info!(tokens, cost_usd, latency_ms, cached, "request complete");

        Ok(EnrichedResponse {
            result,
            cached,
            latency_ms: round_to(latency_ms, 2),
            estimated_cost_usd: round_to(cost_usd, 6),
        })
    }

    /// Route a decoded [`GenerationRequest`].
    pub async fn route_request(&self, request: &GenerationRequest) -> Result<EnrichedResponse> {
        self.route(
            &request.model,
            &request.messages,
            request.temperature,
            request.max_tokens,
        )
        .await
    }

    fn cached(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> Option<GenerationResult> {
        let cache = self.cache.as_ref()?;
        let hit = cache.get(model, messages, temperature, max_tokens);
        if hit.is_none() {
            debug!("cache miss");
        }
        hit
    }

    /// Record a failed request and hand the error back.
    ///
    /// Names missing from the catalog are recorded under [`UNLISTED_MODEL`].
    fn fail(&self, model: &str, start: Instant, err: HermodError) -> HermodError {
        let key = if self.catalog.contains(model) {
            model
        } else {
            UNLISTED_MODEL
        };
        self.metrics
            .record(&Observation::failure(key, elapsed_ms(start)));
        warn!(error = %err, "request failed");
        err
    }

    /// Every catalog entry, in catalog order.
    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.catalog.list().to_vec()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Metrics snapshot plus cache statistics.
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            metrics: self.metrics.snapshot(),
            cache: self
                .cache
                .as_ref()
                .map_or_else(CacheStats::disabled, |c| c.stats()),
        }
    }

    /// Zero the metrics and drop every cached response.
    pub fn reset(&self) {
        self.metrics.reset();
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
