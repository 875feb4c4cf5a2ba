//! Time-bounded memo of successful GET responses, keyed by the built URL.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Thread-safe response cache with a single TTL applied to every entry.
///
/// Each [`crate::BsaleClient`] owns its own cache; separately constructed
/// clients never share entries.
pub(crate) struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value if present and `now < expires_at`.
    ///
    /// Expired entries are evicted on the way out.
    pub(crate) fn lookup(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    /// Inserts or overwrites an entry. A zero TTL stores nothing.
    pub(crate) fn store(&self, key: impl Into<String>, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    /// Clears every entry when `pattern` is `None` or empty, otherwise every
    /// entry whose key contains `pattern` (plain, case-sensitive substring).
    pub(crate) fn invalidate(&self, pattern: Option<&str>) {
        match pattern.filter(|pattern| !pattern.is_empty()) {
            Some(pattern) => self.entries.retain(|key, _| !key.contains(pattern)),
            None => self.entries.clear(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use serde_json::json;

    use super::ResponseCache;

    const PRODUCTS: &str = "https://api.bsale.io/v1/products.json";
    const PRODUCT: &str = "https://api.bsale.io/v1/products/5.json";
    const CLIENTS: &str = "https://api.bsale.io/v1/clients.json";

    fn filled() -> ResponseCache {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.store(PRODUCTS, json!({"items": []}));
        cache.store(PRODUCT, json!({"id": 5}));
        cache.store(CLIENTS, json!({"items": [1]}));
        cache
    }

    #[test]
    fn lookup_returns_fresh_entry() {
        let cache = filled();
        assert_eq!(cache.lookup(PRODUCT), Some(json!({"id": 5})));
        assert_eq!(cache.lookup("https://api.bsale.io/v1/missing.json"), None);
    }

    #[test]
    fn store_overwrites_existing_entry() {
        let cache = filled();
        cache.store(PRODUCT, json!({"id": 6}));
        assert_eq!(cache.lookup(PRODUCT), Some(json!({"id": 6})));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn zero_ttl_never_serves_entries() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.store(PRODUCTS, json!({}));
        assert_eq!(cache.lookup(PRODUCTS), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_ttl_does_not_accumulate_entries() {
        let cache = ResponseCache::new(Duration::ZERO);
        for id in 0..100 {
            cache.store(format!("https://api.bsale.io/v1/products/{id}.json"), json!({"id": id}));
        }
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn expired_entry_is_treated_as_absent_and_evicted() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.store(PRODUCTS, json!({}));
        assert!(cache.lookup(PRODUCTS).is_some());
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.lookup(PRODUCTS), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn pattern_invalidation_removes_matching_keys_only() {
        let cache = filled();
        cache.invalidate(Some("products"));
        assert_eq!(cache.lookup(PRODUCTS), None);
        assert_eq!(cache.lookup(PRODUCT), None);
        assert!(cache.lookup(CLIENTS).is_some());
    }

    #[test]
    fn pattern_invalidation_is_case_sensitive() {
        let cache = filled();
        cache.invalidate(Some("Products"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidation_without_pattern_flushes_everything() {
        let cache = filled();
        cache.invalidate(None);
        assert_eq!(cache.len(), 0);

        let cache = filled();
        cache.invalidate(Some(""));
        assert_eq!(cache.len(), 0);
    }
}
