//! Response DTOs for the maintenance API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, EntryMeta};
use crate::query::QueryStatsSummary;

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub item_count: usize,
    pub hit_rate_percent: f64,
    pub memory_usage_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub query_stats: QueryStatsSummary,
}

impl StatsResponse {
    /// Creates a new StatsResponse from the store and query snapshots
    pub fn new(cache: CacheStats, query_stats: QueryStatsSummary) -> Self {
        Self {
            item_count: cache.item_count,
            hit_rate_percent: cache.hit_rate_percent,
            memory_usage_bytes: cache.memory_usage_bytes,
            hits: cache.hits,
            misses: cache.misses,
            sets: cache.sets,
            deletes: cache.deletes,
            evictions: cache.evictions,
            query_stats,
        }
    }
}

/// Response body for tag and pattern invalidation
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Entries actually deleted
    pub invalidated: usize,
}

impl InvalidateResponse {
    pub fn for_tag(tag: impl Into<String>, invalidated: usize) -> Self {
        Self {
            tag: Some(tag.into()),
            pattern: None,
            invalidated,
        }
    }

    pub fn for_pattern(pattern: impl Into<String>, invalidated: usize) -> Self {
        Self {
            tag: None,
            pattern: Some(pattern.into()),
            invalidated,
        }
    }
}

/// Response body for POST /cache/purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub removed: usize,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Response body for GET /cache/entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: String,
    #[serde(flatten)]
    pub meta: EntryMeta,
    pub tags: Vec<String>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
