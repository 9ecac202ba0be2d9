//! In-memory store for analysis results, keyed by fingerprint.
//!
//! Entries are logically immutable: the same fingerprint always recomputes
//! to an equivalent value, so an overwrite is safe but redundant. The store
//! keeps hit/miss counters for diagnostics. All state is process-lifetime
//! only — there is deliberately no persistence.

use serde_json::Value;
use std::collections::HashMap;

/// Result store keyed by `namespace:digest` fingerprints.
///
/// Not internally synchronized — the coordinator holds it behind its own
/// mutex alongside the task registry.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, Value>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached result, counting the hit or miss.
    pub fn get(&mut self, fingerprint: &str) -> Option<&Value> {
        match self.entries.get(fingerprint) {
            Some(value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Whether a result exists for the fingerprint, without touching counters.
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Store a result. Last writer wins; values for the same fingerprint are
    /// equivalent by construction.
    pub fn insert(&mut self, fingerprint: String, value: Value) {
        self.entries.insert(fingerprint, value);
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache hit count.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Cache miss count.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Hit rate as a fraction (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_get() {
        let mut cache = ResultCache::new();
        cache.insert("aep:abc".into(), json!({"aep_gwh": 13.2}));

        let hit = cache.get("aep:abc");
        assert_eq!(hit, Some(&json!({"aep_gwh": 13.2})));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn miss_is_counted() {
        let mut cache = ResultCache::new();
        assert_eq!(cache.get("aep:missing"), None);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn contains_does_not_touch_counters() {
        let mut cache = ResultCache::new();
        cache.insert("k".into(), json!(1));
        assert!(cache.contains("k"));
        assert!(!cache.contains("other"));
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let mut cache = ResultCache::new();
        cache.insert("k".into(), json!(1));
        cache.insert("k".into(), json!(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn hit_rate_computation() {
        let mut cache = ResultCache::new();
        cache.insert("k".into(), json!(1));
        cache.get("k"); // hit
        cache.get("other"); // miss
        assert!((cache.hit_rate() - 0.5).abs() < 0.01);
    }
}
