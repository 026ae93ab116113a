//! Cache-aside runner for named async operations.
//!
//! `QueryCache::run` looks the result up under a key derived from the
//! operation name and its parameters, executes the operation on a miss,
//! writes the result back with its TTL and tags, and keeps per-name timing
//! statistics. Errors from the operation itself are returned untouched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{key_for, CacheService};
use crate::query::stats::{summarize, QueryStats, QueryStatsSummary};
use crate::query::DEFAULT_SLOW_QUERY_THRESHOLD_MS;

// == Query Options ==
/// Per-call caching options.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// TTL in seconds; None uses the store's default
    pub ttl_seconds: Option<u64>,
    pub tags: Vec<String>,
    /// When false the operation always runs and nothing is cached
    pub use_cache: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            ttl_seconds: None,
            tags: Vec::new(),
            use_cache: true,
        }
    }
}

impl QueryOptions {
    /// Cached for `ttl_seconds`.
    pub fn ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: Some(ttl_seconds),
            ..Self::default()
        }
    }

    /// Never served from cache, e.g. free-text search.
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

// == Query Cache ==
#[derive(Clone, Debug)]
pub struct QueryCache {
    cache: CacheService,
    stats: Arc<Mutex<HashMap<String, QueryStats>>>,
    slow_threshold_ms: u64,
}

impl QueryCache {
    pub fn new(cache: CacheService) -> Self {
        Self::with_slow_threshold(cache, DEFAULT_SLOW_QUERY_THRESHOLD_MS)
    }

    pub fn with_slow_threshold(cache: CacheService, slow_threshold_ms: u64) -> Self {
        Self {
            cache,
            stats: Arc::new(Mutex::new(HashMap::new())),
            slow_threshold_ms,
        }
    }

    /// The shared cache this runner reads and writes.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    // == Run ==
    /// Returns the cached result of `name(params)` or executes `operation`.
    ///
    /// Results that serialize to JSON `null` are never stored. If a key cannot
    /// be built from `params`, the operation runs uncached.
    pub async fn run<T, P, F, Fut, E>(
        &self,
        name: &str,
        params: &P,
        options: QueryOptions,
        operation: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !options.use_cache {
            return self.execute(name, operation).await;
        }

        let key = match key_for(name, params) {
            Ok(key) => key,
            Err(err) => {
                warn!(query = name, error = %err, "could not build query cache key, running uncached");
                return self.execute(name, operation).await;
            }
        };

        if let Some(cached) = self.cache.get::<T>(&key).await {
            self.with_stats(name, |stats| stats.record_hit());
            debug!(query = name, outcome = "hit", "query served from cache");
            return Ok(cached);
        }

        debug!(query = name, outcome = "miss", "executing query");
        let value = self.execute(name, operation).await?;

        if is_null(&value) {
            debug!(query = name, "null result not cached");
        } else {
            self.cache
                .set_tagged(&key, &value, options.ttl_seconds, &options.tags)
                .await;
        }

        Ok(value)
    }

    // == Stats ==
    /// Summary over every operation name seen so far.
    pub async fn stats(&self) -> QueryStatsSummary {
        let hit_rate = self.cache.stats().await.hit_rate_percent;
        summarize(&self.lock_stats(), hit_rate)
    }

    /// Snapshot of one operation's statistics.
    pub fn stats_for(&self, name: &str) -> Option<QueryStats> {
        self.lock_stats().get(name).cloned()
    }

    pub fn reset_stats(&self) {
        self.lock_stats().clear();
    }

    // == Internals ==
    async fn execute<T, E, F, Fut>(&self, name: &str, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let result = operation().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let threshold = self.slow_threshold_ms;
        self.with_stats(name, |stats| stats.record_execution(elapsed_ms, threshold));
        if elapsed_ms > threshold {
            warn!(query = name, elapsed_ms, threshold_ms = threshold, "slow query");
        }

        result
    }

    fn with_stats(&self, name: &str, update: impl FnOnce(&mut QueryStats)) {
        let mut stats = self.lock_stats();
        update(stats.entry(name.to_string()).or_default());
    }

    fn lock_stats(&self) -> MutexGuard<'_, HashMap<String, QueryStats>> {
        match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    lock_kind = "mutex.lock",
                    result = "poisoned_recovered",
                    "Recovered from poisoned query stats lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

fn is_null<T: Serialize>(value: &T) -> bool {
    serde_json::to_value(value).is_ok_and(|v| v.is_null())
}
