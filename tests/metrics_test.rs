//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use hermod::providers::{ConverseReply, ConverseRequest, ModelProvider, ReplyUsage};
use hermod::stats::{MetricsAggregator, Observation};
use hermod::{Hermod, HermodError, Message, Result, telemetry};

// ============================================================================
// Mock providers
// ============================================================================

struct MockProvider;

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn converse(&self, _request: &ConverseRequest) -> Result<ConverseReply> {
        Ok(ConverseReply {
            content: Some("ok".to_string()),
            usage: Some(ReplyUsage::new(100, 50)),
            stop_reason: None,
        })
    }
}

struct FailingProvider;

#[async_trait]
impl ModelProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn converse(&self, _request: &ConverseRequest) -> Result<ConverseReply> {
        Err(HermodError::provider("AccessDeniedException", "denied"))
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric name whose labels include `label=value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_and_cached_requests_record_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let router = Hermod::builder().provider(MockProvider).build().unwrap();
                let messages = [Message::user("hello")];
                router.route("nova-lite", &messages, 0.7, 50).await.unwrap();
                router.route("nova-lite", &messages, 0.7, 50).await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "cached", "true"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "ok"),
        2
    );
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 300);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_request_records_error_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let router = Hermod::builder().provider(FailingProvider).build().unwrap();
                let _ = router.route("nova-lite", &[Message::user("hi")], 0.7, 50).await;
                let _ = router.route("no-such-model", &[Message::user("hi")], 0.7, 50).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "error"),
        2
    );
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 0);
}

#[test]
fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let aggregator = MetricsAggregator::new();
    aggregator.record(&Observation::success("nova-lite", 10, 0.001, 5.0, false));
    assert_eq!(aggregator.snapshot().total_requests, 1);
}

#[test]
fn aggregator_totals_match_observations() {
    let aggregator = MetricsAggregator::new();
    let successes = 7;
    let failures = 3;
    for i in 0..successes {
        let model = if i % 2 == 0 { "nova-lite" } else { "nova-pro" };
        aggregator.record(&Observation::success(model, 100, 0.5, 10.0, i % 3 == 0));
    }
    for _ in 0..failures {
        aggregator.record(&Observation::failure("nova-lite", 10.0));
    }

    let s = aggregator.snapshot();
    assert_eq!(s.total_requests, successes + failures);
    assert_eq!(s.successful_requests, successes);
    assert_eq!(s.failed_requests, failures);
    assert_eq!(s.total_tokens, 700);
    assert_eq!(s.total_cost_usd, 3.5);
    assert_eq!(s.cache_hits, 3);
    assert_eq!(s.cache_hit_rate_percent, 30.0);
    assert_eq!(s.average_latency_ms, 10.0);
    assert_eq!(s.requests_by_model.values().sum::<u64>(), s.total_requests);
    assert_eq!(s.tokens_by_model.values().sum::<u64>(), s.total_tokens);
    assert_eq!(s.requests_by_model["nova-lite"], 4 + failures);
}

#[test]
fn concurrent_records_are_never_lost() {
    let aggregator = Arc::new(MetricsAggregator::new());
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let aggregator = Arc::clone(&aggregator);
            std::thread::spawn(move || {
                for _ in 0..250 {
                    if t % 2 == 0 {
                        aggregator.record(&Observation::success("nova-lite", 2, 0.0, 1.0, false));
                    } else {
                        aggregator.record(&Observation::failure("nova-pro", 1.0));
                    }
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let s = aggregator.snapshot();
    assert_eq!(s.total_requests, 2000);
    assert_eq!(s.failed_requests, 1000);
    assert_eq!(s.total_tokens, 2000);
    assert_eq!(s.requests_by_model["nova-lite"], 1000);
}
