//! Query Result Cache
//!
//! Session-scoped memo of answers keyed by exact question text and result
//! size. Entries expire after a fixed TTL (purged when looked up) and the
//! oldest insertion is evicted once capacity is exceeded. When disabled the
//! cache stores nothing and every lookup misses.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::info;

use crate::ai::truncate_chars;
use crate::constants::cache::{LOGGED_QUERY_CHARS, MAX_QUERY_CACHE_ENTRIES, QUERY_CACHE_TTL_SECS};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CachedResult<V> {
    value: V,
    inserted: Instant,
}

type CacheKey = (String, usize);

/// TTL + capacity bounded query cache
pub struct QueryCache<V> {
    enabled: bool,
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<CacheKey, CachedResult<V>>,
    stats: CacheStats,
}

impl<V: Clone> QueryCache<V> {
    /// Cache with the standard TTL and capacity
    pub fn new(enabled: bool) -> Self {
        Self::with_limits(
            enabled,
            Duration::from_secs(QUERY_CACHE_TTL_SECS),
            MAX_QUERY_CACHE_ENTRIES,
        )
    }

    pub fn with_limits(enabled: bool, ttl: Duration, max_entries: usize) -> Self {
        Self {
            enabled,
            ttl,
            max_entries,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&mut self, query: &str, size: usize) -> Option<V> {
        self.get_at(query, size, Instant::now())
    }

    pub fn get_at(&mut self, query: &str, size: usize, now: Instant) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let key = (query.to_string(), size);
        let expired = match self.entries.get(&key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => now.saturating_duration_since(entry.inserted) >= self.ttl,
        };

        if expired {
            self.entries.remove(&key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }

        self.stats.hits += 1;
        info!(
            query = truncate_chars(query, LOGGED_QUERY_CHARS),
            size, "Query cache hit"
        );
        self.entries.get(&key).map(|entry| entry.value.clone())
    }

    pub fn put(&mut self, query: &str, size: usize, value: V) {
        self.put_at(query, size, value, Instant::now());
    }

    pub fn put_at(&mut self, query: &str, size: usize, value: V, now: Instant) {
        if !self.enabled {
            return;
        }

        self.entries.insert(
            (query.to_string(), size),
            CachedResult {
                value,
                inserted: now,
            },
        );

        while self.entries.len() > self.max_entries {
            self.evict_oldest();
        }

        info!(
            query = truncate_chars(query, LOGGED_QUERY_CHARS),
            size,
            cache_size = self.entries.len(),
            "Query result cached"
        );
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> QueryCache<String> {
        QueryCache::new(true)
    }

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = cache();
        let t0 = Instant::now();
        cache.put_at("why 500s?", 10, "answer".to_string(), t0);

        let hit = cache.get_at("why 500s?", 10, t0 + Duration::from_secs(299));
        assert_eq!(hit.as_deref(), Some("answer"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_expired_entry_removed_on_lookup() {
        let mut cache = cache();
        let t0 = Instant::now();
        cache.put_at("q", 10, "a".to_string(), t0);

        assert_eq!(cache.get_at("q", 10, t0 + Duration::from_secs(301)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_entry_expires_at_exactly_ttl() {
        let mut cache = cache();
        let t0 = Instant::now();
        cache.put_at("q", 10, "a".to_string(), t0);

        assert_eq!(
            cache.get_at("q", 10, t0 + Duration::from_secs(300) - Duration::from_millis(1)),
            Some("a".to_string())
        );
        assert_eq!(cache.get_at("q", 10, t0 + Duration::from_secs(300)), None);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_key_includes_size() {
        let mut cache = cache();
        let t0 = Instant::now();
        cache.put_at("q", 10, "ten".to_string(), t0);

        assert_eq!(cache.get_at("q", 20, t0), None);
        assert_eq!(cache.get_at("q", 10, t0).as_deref(), Some("ten"));
        assert_eq!(cache.get_at("Q", 10, t0), None);
    }

    #[test]
    fn test_capacity_evicts_oldest_insertion() {
        let mut cache = cache();
        let t0 = Instant::now();
        for i in 0..51u64 {
            cache.put_at(&format!("q{i}"), 10, format!("a{i}"), t0 + Duration::from_millis(i));
        }

        assert_eq!(cache.len(), 50);
        assert_eq!(cache.stats().evictions, 1);
        let later = t0 + Duration::from_secs(1);
        assert_eq!(cache.get_at("q0", 10, later), None);
        assert_eq!(cache.get_at("q1", 10, later).as_deref(), Some("a1"));
        assert_eq!(cache.get_at("q50", 10, later).as_deref(), Some("a50"));
    }

    #[test]
    fn test_disabled_cache_is_bypassed() {
        let mut cache: QueryCache<String> = QueryCache::new(false);
        cache.put("q", 10, "a".to_string());

        assert!(cache.is_empty());
        assert_eq!(cache.get("q", 10), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_clear_and_hit_rate() {
        let mut cache = cache();
        cache.put("q", 1, "a".to_string());
        cache.get("q", 1);
        cache.get("other", 1);
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
