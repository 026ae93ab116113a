//! Cache Service
//!
//! The explicit, cloneable handle to the one store a process shares. Built
//! once at start-up and handed to every collaborator that caches something.
//! Typed values are serialized with serde_json here, and this is the
//! fail-open boundary: any internal error is logged and reported as a miss
//! or a `false` write.

use std::sync::Arc;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, EntryMeta};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Service ==
#[derive(Clone, Debug)]
pub struct CacheService {
    store: Arc<RwLock<CacheStore>>,
}

impl CacheService {
    // == Constructors ==
    pub fn new(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Builds the store from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::new(config.max_items, config.default_ttl))
    }

    // == Get ==
    /// Reads and decodes a value. Missing, expired and undecodable entries
    /// all come back as None; an undecodable entry is dropped.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;
        let bytes = store.get(key)?;
        match decode(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "dropping undecodable cache entry");
                store.discard_corrupted(key);
                None
            }
        }
    }

    /// Reads the stored bytes without decoding them.
    pub async fn get_raw(&self, key: &str) -> Option<Bytes> {
        self.store.write().await.get(key)
    }

    /// Drops an entry a caller could not use after reading it; the read
    /// counts as a miss.
    pub async fn discard_corrupted(&self, key: &str) -> bool {
        self.store.write().await.discard_corrupted(key)
    }

    // == Set ==
    /// Serializes and stores a value. Returns false if serialization failed;
    /// existing entries are left untouched in that case.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        self.set_tagged(key, value, ttl, &[]).await
    }

    /// Serializes, stores and tags a value under one lock acquisition.
    pub async fn set_tagged<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
        tags: &[String],
    ) -> bool {
        match encode(value) {
            Ok(bytes) => self.set_raw(key, bytes, ttl, tags).await,
            Err(err) => {
                warn!(key, error = %err, "cache write skipped");
                self.store.write().await.record_failed_set();
                false
            }
        }
    }

    /// Stores already-serialized bytes.
    pub async fn set_raw(&self, key: &str, value: Bytes, ttl: Option<u64>, tags: &[String]) -> bool {
        let stored = self.store.write().await.set_tagged(key, value, ttl, tags);
        debug!(key, tags = tags.len(), "cache write");
        stored
    }

    // == Delete / Clear ==
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) -> bool {
        self.store.write().await.clear()
    }

    // == Maintenance ==
    /// Removes every currently-expired entry.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Tags ==
    pub async fn tag(&self, key: &str, tags: &[String]) {
        self.store.write().await.tag(key, tags);
    }

    /// Deletes every entry tagged `tag`; returns how many were deleted.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        self.store.write().await.invalidate_tag(tag)
    }

    /// Deletes every tagged entry whose key matches `prefix*` (or exactly).
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        self.store.write().await.invalidate_pattern(pattern)
    }

    pub async fn tags_for(&self, key: &str) -> Vec<String> {
        self.store.read().await.tags_for(key)
    }

    // == Introspection ==
    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains(key)
    }

    pub async fn entry_meta(&self, key: &str) -> Option<EntryMeta> {
        self.store.read().await.entry_meta(key)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

// == Codec ==
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| CacheError::Corrupted(err.to_string()))
}
