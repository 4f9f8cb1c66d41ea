//! TTL-gated response cache with an LRU bound.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::providers::ProviderId;
use crate::types::CompletionResponse;

#[derive(Debug)]
struct Entry {
    response: CompletionResponse,
    stored_at: Instant,
}

/// Concurrent lookups of the same key do not share an in-flight request;
/// each miss issues its own call.
#[derive(Debug)]
pub(super) struct ResponseCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl: config.ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Key over everything that shapes the vendor response.
    pub fn key(provider: ProviderId, path: &str, payload: &Value) -> String {
        format!("{provider}|{path}|{payload}")
    }

    pub fn get(&self, key: &str) -> Option<CompletionResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = entries.get(key)?.stored_at.elapsed() < self.ttl;
        if fresh {
            entries.get(key).map(|entry| entry.response.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    pub fn put(&self, key: String, response: CompletionResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(
            key,
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(text: &str) -> CompletionResponse {
        CompletionResponse {
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = ResponseCache::new(CacheConfig {
            ttl: Duration::ZERO,
            capacity: 4,
        });
        cache.put("k".into(), response("a"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn capacity_bounds_entries() {
        let cache = ResponseCache::new(CacheConfig {
            ttl: Duration::from_secs(60),
            capacity: 2,
        });
        cache.put("a".into(), response("a"));
        cache.put("b".into(), response("b"));
        assert_eq!(cache.get("a").map(|r| r.text), Some("a".to_string()));
        cache.put("c".into(), response("c"));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn key_distinguishes_payloads() {
        let a = ResponseCache::key(ProviderId::OpenAi, "/chat/completions", &json!({"t": 0.1}));
        let b = ResponseCache::key(ProviderId::OpenAi, "/chat/completions", &json!({"t": 0.2}));
        assert_ne!(a, b);
    }
}
