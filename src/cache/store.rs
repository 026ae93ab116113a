//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, lazy TTL
//! expiration and the tag index. The store is the single owner of both the
//! entry map and the tag relation, so every removal path keeps them in sync.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::cache::{
    CacheEntry, CacheMetrics, CacheStats, EntryMeta, LruTracker, SharedClock, SystemClock,
    TagIndex,
};

// == Cache Store ==
/// Main cache storage with LRU eviction, TTL support and tag invalidation.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// tag <-> key relation
    tags: TagIndex,
    /// Performance statistics
    metrics: CacheMetrics,
    /// Maximum number of entries allowed
    max_items: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    clock: SharedClock,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_items` - Maximum number of entries the cache can hold (at least 1)
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_items: usize, default_ttl: u64) -> Self {
        Self::with_clock(max_items, default_ttl, Arc::new(SystemClock))
    }

    /// Same as [`CacheStore::new`] with an explicit time source.
    pub fn with_clock(max_items: usize, default_ttl: u64, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            tags: TagIndex::new(),
            metrics: CacheMetrics::new(),
            max_items: max_items.max(1),
            default_ttl,
            clock,
        }
    }

    // == Set ==
    /// Stores a serialized value with optional TTL.
    ///
    /// If the key already exists, the value is overwritten, the TTL is reset
    /// and its tags are kept. If the cache is at capacity, the least recently
    /// used entry is evicted first. A TTL of 0 is treated as already expired:
    /// the write is counted but nothing is stored and any previous value under
    /// the key is dropped.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The serialized value
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&mut self, key: impl Into<String>, value: Bytes, ttl: Option<u64>) -> bool {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = self.clock.now_ms();

        self.metrics.record_set();

        if ttl == 0 {
            if self.remove_entry(&key).is_some() {
                debug!(key = %key, "zero ttl write dropped existing entry");
            }
            return true;
        }

        let previous_size = self.entries.get(&key).map(|entry| entry.size_bytes);
        match previous_size {
            Some(size) => self.metrics.sub_bytes(size),
            None if self.entries.len() >= self.max_items => self.evict_one(),
            None => {}
        }

        let entry = CacheEntry::new(&key, value, ttl, now);
        self.metrics.add_bytes(entry.size_bytes);
        self.lru.touch(&key);
        self.entries.insert(key, entry);

        true
    }

    // == Set Tagged ==
    /// Stores a value and registers it under `tags` in one step.
    pub fn set_tagged<S: AsRef<str>>(
        &mut self,
        key: impl Into<String>,
        value: Bytes,
        ttl: Option<u64>,
        tags: &[S],
    ) -> bool {
        let key = key.into();
        let stored = self.set(key.clone(), value, ttl);
        if stored {
            self.tag(&key, tags);
        }
        stored
    }

    /// Counts a write that failed before reaching the store.
    pub fn record_failed_set(&mut self) {
        self.metrics.record_set();
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired. Expired entries are
    /// removed, counted as misses and as evictions.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.metrics.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.metrics.record_miss();
            self.metrics.record_eviction();
            debug!(key, "expired entry removed on access");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.record_access(now);
        let value = entry.value.clone();
        self.metrics.record_hit();
        self.lru.touch(key);
        Some(value)
    }

    // == Delete ==
    /// Removes an entry by key. Returns false if nothing was stored.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.remove_entry(key).is_some() {
            self.metrics.record_delete();
            true
        } else {
            false
        }
    }

    /// Drops an entry whose payload turned out to be unreadable right after
    /// a `get` counted it as a hit. Recorded as a miss, not as a delete.
    pub fn discard_corrupted(&mut self, key: &str) -> bool {
        if self.remove_entry(key).is_some() {
            self.metrics.reclassify_hit_as_miss();
            debug!(key, "corrupted entry discarded");
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Drops every entry and tag and resets all metrics.
    pub fn clear(&mut self) -> bool {
        self.entries.clear();
        self.lru.clear();
        self.tags.clear();
        self.metrics = CacheMetrics::new();
        info!("cache cleared");
        true
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.entries.len())
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
            self.metrics.record_eviction();
        }

        expired_keys.len()
    }

    // == Tag ==
    /// Registers `key` under each of `tags`.
    ///
    /// Keys that are not currently stored are ignored so the index never
    /// points at an absent entry.
    pub fn tag<S: AsRef<str>>(&mut self, key: &str, tags: &[S]) {
        if tags.is_empty() || !self.entries.contains_key(key) {
            return;
        }
        self.tags.attach(key, tags);
    }

    // == Invalidate Tag ==
    /// Deletes every key carrying `tag` and drops the tag.
    ///
    /// Returns the number of entries actually deleted.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let keys = self.tags.take_tag(tag);
        let attempted = keys.len();
        let deleted = keys.iter().filter(|key| self.delete(key)).count();

        info!(tag, attempted, deleted, "invalidated cache tag");
        deleted
    }

    // == Invalidate Pattern ==
    /// Deletes every tagged key matching `pattern` (`prefix*` or exact).
    ///
    /// Untagged keys are not considered.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let keys = self.tags.matching_keys(pattern);
        let deleted = keys.iter().filter(|key| self.delete(key)).count();

        info!(pattern, deleted, "invalidated cache pattern");
        deleted
    }

    // == Introspection ==
    /// Tags currently attached to `key`.
    pub fn tags_for(&self, key: &str) -> Vec<String> {
        self.tags.tags_for(key)
    }

    /// Keys currently registered under `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        self.tags.keys_for(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.tag_count()
    }

    /// Metadata for a live entry, without counting as an access.
    pub fn entry_meta(&self, key: &str) -> Option<EntryMeta> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.meta(now))
    }

    /// True if `key` is stored and live. Does not touch stats or recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Internals ==
    fn evict_one(&mut self) {
        if let Some(victim) = self.lru.evict_oldest() {
            self.remove_entry(&victim);
            self.metrics.record_eviction();
            debug!(key = %victim, "evicted least recently used entry");
        }
    }

    /// Removes an entry from every structure the store keeps.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.tags.detach(key);
        self.metrics.sub_bytes(entry.size_bytes);
        Some(entry)
    }
}
