//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use bytes::Bytes;
use serde::Serialize;

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored (already serialized) value
    pub value: Bytes,
    /// TTL in seconds; 0 means the entry is never live
    pub ttl_seconds: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read, or creation time if never read
    pub last_accessed_at: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Approximate size: key length plus value length
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with `now_ms`.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under (only used for sizing)
    /// * `value` - Serialized payload
    /// * `ttl_seconds` - Lifetime in seconds
    /// * `now_ms` - Current time in Unix milliseconds
    pub fn new(key: &str, value: Bytes, ttl_seconds: u64, now_ms: u64) -> Self {
        let size_bytes = key.len() + value.len();
        Self {
            value,
            ttl_seconds,
            created_at: now_ms,
            last_accessed_at: now_ms,
            access_count: 0,
            size_bytes,
        }
    }

    // == Expires At ==
    /// Timestamp (Unix milliseconds) at which the entry stops being live.
    pub fn expires_at(&self) -> u64 {
        self.created_at
            .saturating_add(self.ttl_seconds.saturating_mul(1000))
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is live iff `now < created_at + ttl`, so it is expired as soon
    /// as the full TTL has elapsed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at()
    }

    // == Record Access ==
    /// Updates access metadata after a successful read.
    pub fn record_access(&mut self, now_ms: u64) {
        self.last_accessed_at = now_ms;
        self.access_count += 1;
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds (0 once expired).
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at().saturating_sub(now_ms)
    }

    /// Snapshot of the entry's metadata, without the payload.
    pub fn meta(&self, now_ms: u64) -> EntryMeta {
        EntryMeta {
            ttl_seconds: self.ttl_seconds,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            access_count: self.access_count,
            size_bytes: self.size_bytes,
            ttl_remaining_ms: self.ttl_remaining_ms(now_ms),
        }
    }
}

// == Entry Metadata ==
/// Read-only view of an entry's bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    pub ttl_seconds: u64,
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub access_count: u64,
    pub size_bytes: usize,
    pub ttl_remaining_ms: u64,
}
