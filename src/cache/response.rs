//! Response cache keyed on an exact request fingerprint.
//!
//! [`ResponseCache`] maps a fingerprint of `(model, messages, temperature,
//! max_tokens)` to the [`GenerationResult`] produced for that request. The
//! fingerprint is exact: identical requests get identical answers, and any
//! change (one character of one message, a different temperature) bypasses
//! the stored answer. It is not a similarity cache.
//!
//! # Architecture
//!
//! The cache sits in the [`Router`](crate::Router), in front of the provider
//! adapter. A hit skips the provider call entirely; cost and metrics are
//! still computed from the cached usage. Entries expire after the configured
//! TTL and the least-recently-used entry is evicted once `max_entries` is
//! reached.
//!
//! Storage is moka's synchronous cache with its LRU eviction policy. moka
//! batches evictions into maintenance passes, so [`ResponseCache::put()`]
//! runs pending maintenance before returning: once `put` completes the cache
//! holds at most `max_entries` entries and the least-recently-used ones are
//! gone.
//!
//! Concurrent identical misses are not coalesced: both callers reach the
//! provider and the later `put` replaces the earlier entry wholesale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cost::round_to;
use crate::telemetry;
use crate::types::{GenerationResult, Message};

/// Configuration for the response cache.
///
/// ```rust
/// # use hermod::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Whether a cache is configured at all.
    pub enabled: bool,
    pub size: u64,
    pub max_size: u64,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses) * 100`, rounded to 2 places; 0 before any lookup.
    pub hit_rate_percent: f64,
}

impl CacheStats {
    /// Stats reported when caching is turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            size: 0,
            max_size: 0,
            ttl_secs: 0,
            hits: 0,
            misses: 0,
            hit_rate_percent: 0.0,
        }
    }
}

/// In-memory LRU + TTL cache of generation results.
pub struct ResponseCache {
    entries: Cache<String, GenerationResult>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            entries,
            config: config.clone(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a cached result.
    ///
    /// Returns `None` when absent or expired. Counts the hit or miss.
    pub fn get(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> Option<GenerationResult> {
        let key = fingerprint(model, messages, temperature, max_tokens);
        match self.entries.get(&key) {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(result)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a result, replacing any previous entry for the same request.
    ///
    /// Evicts down to `max_entries` (least recently used first) before
    /// returning.
    pub fn put(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
        response: GenerationResult,
    ) {
        let key = fingerprint(model, messages, temperature, max_tokens);
        self.entries.insert(key, response);
        self.entries.run_pending_tasks();
    }

    /// Number of live entries, after applying pending evictions.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict every entry. Hit/miss counters are kept.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Size, bound and cumulative hit rate.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate_percent = if lookups == 0 {
            0.0
        } else {
            round_to(hits as f64 / lookups as f64 * 100.0, 2)
        };
        CacheStats {
            enabled: true,
            size: self.len(),
            max_size: self.config.max_entries,
            ttl_secs: self.config.ttl.as_secs(),
            hits,
            misses,
            hit_rate_percent,
        }
    }
}

/// Deterministic cache key for a request.
///
/// SHA-256 (lowercase hex) over a length-prefixed encoding of every input:
/// the model name, each message's role and exact content in order, the
/// temperature's bit pattern and `max_tokens`. `-0.0` and `0.0` share a
/// bit pattern here. Length prefixes keep field
/// boundaries unambiguous, so `("ab", "c")` and `("a", "bc")` never share an
/// encoding. Stable across processes.
pub fn fingerprint(model: &str, messages: &[Message], temperature: f64, max_tokens: u32) -> String {
    let mut hasher = Sha256::new();
    write_field(&mut hasher, model.as_bytes());
    hasher.update((messages.len() as u64).to_le_bytes());
    for msg in messages {
        write_field(&mut hasher, msg.role.as_str().as_bytes());
        write_field(&mut hasher, msg.content.as_bytes());
    }
    // -0.0 + 0.0 == +0.0
    hasher.update((temperature + 0.0).to_bits().to_le_bytes());
    hasher.update(max_tokens.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
