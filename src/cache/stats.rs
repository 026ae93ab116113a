//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, sets, deletes,
//! evictions and approximate memory usage.

use serde::Serialize;

// == Cache Metrics ==
/// Process-wide counters owned by the store. Reset only by `clear()`.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of writes, including failed ones
    pub sets: u64,
    /// Number of successful explicit deletes
    pub deletes: u64,
    /// Entries removed by LRU pressure or TTL expiry
    pub evictions: u64,
    /// Sum of `size_bytes` over all stored entries
    pub memory_usage_bytes: usize,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Turns an already counted hit into a miss.
    pub fn reclassify_hit_as_miss(&mut self) {
        self.hits = self.hits.saturating_sub(1);
        self.misses += 1;
    }

    // == Memory Gauge ==
    pub fn add_bytes(&mut self, bytes: usize) {
        self.memory_usage_bytes += bytes;
    }

    pub fn sub_bytes(&mut self, bytes: usize) {
        self.memory_usage_bytes = self.memory_usage_bytes.saturating_sub(bytes);
    }

    // == Snapshot ==
    /// Builds the read-only stats view for `item_count` live-or-lazy entries.
    pub fn snapshot(&self, item_count: usize) -> CacheStats {
        CacheStats {
            item_count,
            hit_rate_percent: hit_rate_percent(self.hits, self.misses),
            memory_usage_bytes: self.memory_usage_bytes,
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            deletes: self.deletes,
            evictions: self.evictions,
        }
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of the store's metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held (expired entries count until they are touched)
    pub item_count: usize,
    /// hits / (hits + misses) * 100, or 0 before any request
    pub hit_rate_percent: f64,
    pub memory_usage_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Total number of `get` calls observed.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}

// == Hit Rate ==
/// Returns hits / (hits + misses) * 100, or 0.0 if no requests have been made.
pub fn hit_rate_percent(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = CacheMetrics::new();
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 0);
        assert_eq!(metrics.sets, 0);
        assert_eq!(metrics.deletes, 0);
        assert_eq!(metrics.evictions, 0);
        assert_eq!(metrics.memory_usage_bytes, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheMetrics::new().snapshot(0);
        assert_eq!(stats.hit_rate_percent, 0.0);
        assert_eq!(stats.requests(), 0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        assert_eq!(metrics.snapshot(0).hit_rate_percent, 100.0);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let mut metrics = CacheMetrics::new();
        metrics.record_miss();
        metrics.record_miss();
        assert_eq!(metrics.snapshot(0).hit_rate_percent, 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.snapshot(0).hit_rate_percent, 75.0);
    }

    #[test]
    fn test_memory_gauge_never_underflows() {
        let mut metrics = CacheMetrics::new();
        metrics.add_bytes(10);
        metrics.sub_bytes(4);
        assert_eq!(metrics.memory_usage_bytes, 6);
        metrics.sub_bytes(100);
        assert_eq!(metrics.memory_usage_bytes, 0);
    }

    #[test]
    fn test_snapshot_carries_counters() {
        let mut metrics = CacheMetrics::new();
        metrics.record_set();
        metrics.record_delete();
        metrics.record_eviction();
        metrics.record_eviction();

        let stats = metrics.snapshot(42);
        assert_eq!(stats.item_count, 42);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.evictions, 2);
    }
}
