//! Tests for the response cache: round-trip, TTL and capacity eviction.

use std::time::Duration;

use hermod::cache::fingerprint;
use hermod::{CacheConfig, GenerationResult, Message, ResponseCache, Usage};

fn result(text: &str) -> GenerationResult {
    GenerationResult {
        content: text.to_string(),
        usage: Usage::new(10, 5),
        finish_reason: "end_turn".to_string(),
        model: "nova-lite".to_string(),
    }
}

fn convo(text: &str) -> Vec<Message> {
    vec![Message::user(text)]
}

#[test]
fn put_then_get_returns_same_result() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let messages = convo("hello");

    assert!(cache.get("nova-lite", &messages, 0.7, 50).is_none());
    cache.put("nova-lite", &messages, 0.7, 50, result("Hello!"));

    let hit = cache.get("nova-lite", &messages, 0.7, 50).unwrap();
    assert_eq!(hit, result("Hello!"));

    let stats = cache.stats();
    assert!(stats.enabled);
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate_percent, 50.0);
    assert_eq!(stats.max_size, 1000);
    assert_eq!(stats.ttl_secs, 3600);
}

#[test]
fn put_overwrites_existing_entry() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let messages = convo("hello");
    cache.put("nova-lite", &messages, 0.7, 50, result("first"));
    cache.put("nova-lite", &messages, 0.7, 50, result("second"));

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get("nova-lite", &messages, 0.7, 50).unwrap().content,
        "second"
    );
}

#[test]
fn any_input_change_misses() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.put("nova-lite", &convo("hello"), 0.7, 50, result("x"));

    assert!(cache.get("nova-pro", &convo("hello"), 0.7, 50).is_none());
    assert!(cache.get("nova-lite", &convo("hello!"), 0.7, 50).is_none());
    assert!(cache.get("nova-lite", &convo("hello"), 0.71, 50).is_none());
    assert!(cache.get("nova-lite", &convo("hello"), 0.7, 49).is_none());
    assert!(
        cache
            .get("nova-lite", &[Message::assistant("hello")], 0.7, 50)
            .is_none()
    );
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let cache = ResponseCache::new(&CacheConfig::new().ttl(Duration::from_millis(50)));
    let messages = convo("hello");
    cache.put("nova-lite", &messages, 0.7, 50, result("x"));
    assert!(cache.get("nova-lite", &messages, 0.7, 50).is_some());

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(cache.get("nova-lite", &messages, 0.7, 50).is_none());
    assert_eq!(cache.len(), 0);
}

#[test]
fn capacity_is_bounded() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(3));
    for i in 0..10 {
        cache.put("nova-lite", &convo(&format!("prompt {i}")), 0.7, 50, result("x"));
    }

    let retrievable = (0..10)
        .filter(|i| {
            cache
                .get("nova-lite", &convo(&format!("prompt {i}")), 0.7, 50)
                .is_some()
        })
        .count();
    assert_eq!(retrievable, 3);
    assert_eq!(cache.stats().size, 3);
}

#[test]
fn least_recently_used_entry_is_evicted() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));
    let (a, b, c) = (convo("a"), convo("b"), convo("c"));

    cache.put("nova-lite", &a, 0.7, 50, result("a"));
    cache.put("nova-lite", &b, 0.7, 50, result("b"));

    // Touch `a` so `b` becomes the least recently used.
    assert!(cache.get("nova-lite", &a, 0.7, 50).is_some());

    cache.put("nova-lite", &c, 0.7, 50, result("c"));

    assert!(cache.get("nova-lite", &b, 0.7, 50).is_none());
    assert!(cache.get("nova-lite", &a, 0.7, 50).is_some());
    assert!(cache.get("nova-lite", &c, 0.7, 50).is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn signed_zero_temperatures_share_an_entry() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.put("nova-lite", &convo("hello"), -0.0, 50, result("x"));
    assert!(cache.get("nova-lite", &convo("hello"), 0.0, 50).is_some());
}

#[test]
fn clear_drops_entries_but_keeps_counters() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.put("nova-lite", &convo("hello"), 0.7, 50, result("x"));
    assert!(cache.get("nova-lite", &convo("hello"), 0.7, 50).is_some());

    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn fingerprint_is_stable_hex() {
    let key = fingerprint("nova-lite", &convo("hello"), 0.7, 50);
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(key, fingerprint("nova-lite", &convo("hello"), 0.7, 50));
}
