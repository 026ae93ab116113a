//! API Handlers
//!
//! HTTP request handlers for the cache maintenance endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheService, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, EntryResponse, HealthResponse, InvalidatePatternRequest, InvalidateResponse,
    PurgeResponse, StatsResponse,
};
use crate::query::QueryCache;

/// Application state shared across all handlers.
///
/// Both fields share the same underlying store, so anything the query
/// wrapper caches is visible to stats and invalidation.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: CacheService,
    pub queries: QueryCache,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        let cache = CacheService::new(cache);
        let queries = QueryCache::new(cache.clone());
        Self { cache, queries }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheService::from_config(config);
        let queries = QueryCache::with_slow_threshold(cache.clone(), config.slow_query_threshold_ms);
        Self { cache, queries }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /cache/stats
///
/// Store counters plus the per-operation query summary.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.stats().await;
    let queries = state.queries.stats().await;

    Json(StatsResponse::new(cache, queries))
}

/// Handler for GET /cache/entries/:key
///
/// Reports entry metadata without touching recency or hit counters.
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let meta = state
        .cache
        .entry_meta(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let tags = state.cache.tags_for(&key).await;

    Ok(Json(EntryResponse { key, meta, tags }))
}

/// Handler for POST /cache/invalidate/tag/:tag
pub async fn invalidate_tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<InvalidateResponse> {
    let invalidated = state.cache.invalidate_tag(&tag).await;

    Json(InvalidateResponse::for_tag(tag, invalidated))
}

/// Handler for POST /cache/invalidate/pattern
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let pattern = req.pattern.trim();
    let invalidated = state.cache.invalidate_pattern(pattern).await;

    Ok(Json(InvalidateResponse::for_pattern(pattern, invalidated)))
}

/// Handler for POST /cache/purge
pub async fn purge_handler(State(state): State<AppState>) -> Json<PurgeResponse> {
    let removed = state.cache.purge_expired().await;

    Json(PurgeResponse { removed })
}

/// Handler for DELETE /cache
///
/// Drops every entry and tag and resets both stat surfaces.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.cache.clear().await;
    state.queries.reset_stats();

    Json(ClearResponse { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryOptions;

    fn test_state() -> AppState {
        AppState::new(CacheStore::new(100, 300))
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_stats_handler_empty() {
        let response = stats_handler(State(test_state())).await;

        assert_eq!(response.item_count, 0);
        assert_eq!(response.hit_rate_percent, 0.0);
        assert_eq!(response.query_stats.total_queries, 0);
    }

    #[tokio::test]
    async fn test_stats_handler_counts_gets() {
        let state = test_state();
        state.cache.set("a", &1, None).await;
        let _: Option<i32> = state.cache.get("a").await;
        let _: Option<i32> = state.cache.get("missing").await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.item_count, 1);
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.hit_rate_percent, 50.0);
    }

    #[tokio::test]
    async fn test_entry_handler() {
        let state = test_state();
        state
            .cache
            .set_tagged("post:1", "hello", Some(60), &tags(&["blogs"]))
            .await;

        let response = entry_handler(State(state.clone()), Path("post:1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.meta.ttl_seconds, 60);
        assert_eq!(response.tags, vec!["blogs".to_string()]);

        let missing = entry_handler(State(state), Path("nope".to_string())).await;
        assert!(matches!(missing, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalidate_tag_handler() {
        let state = test_state();
        state.cache.set_tagged("a", &1, None, &tags(&["blogs"])).await;
        state.cache.set_tagged("b", &2, None, &tags(&["blogs"])).await;
        state.cache.set_tagged("c", &3, None, &tags(&["users"])).await;

        let response = invalidate_tag_handler(State(state.clone()), Path("blogs".to_string())).await;
        assert_eq!(response.invalidated, 2);
        assert_eq!(response.tag.as_deref(), Some("blogs"));
        assert!(state.cache.contains("c").await);
    }

    #[tokio::test]
    async fn test_invalidate_pattern_handler() {
        let state = test_state();
        state.cache.set_tagged("api:projects", &1, None, &tags(&["api"])).await;
        state.cache.set_tagged("api:users", &2, None, &tags(&["api"])).await;
        state.cache.set_tagged("other", &3, None, &tags(&["misc"])).await;
        state.cache.set("api:untagged", &4, None).await;

        let req = InvalidatePatternRequest {
            pattern: "api:*".to_string(),
        };
        let response = invalidate_pattern_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.invalidated, 2);
        assert!(state.cache.contains("other").await);
        assert!(state.cache.contains("api:untagged").await);
    }

    #[tokio::test]
    async fn test_invalidate_pattern_rejects_empty() {
        let req = InvalidatePatternRequest {
            pattern: " ".to_string(),
        };
        let result = invalidate_pattern_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_purge_handler_on_fresh_entries() {
        let state = test_state();
        state.cache.set("a", &1, Some(3600)).await;

        let response = purge_handler(State(state.clone())).await;
        assert_eq!(response.removed, 0);
        assert!(state.cache.contains("a").await);
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = test_state();
        state.cache.set("a", &1, None).await;
        let _ = state
            .queries
            .run("op", &(), QueryOptions::default(), || async {
                Ok::<_, CacheError>(1)
            })
            .await;

        let response = clear_handler(State(state.clone())).await;
        assert!(response.cleared);
        assert!(state.cache.is_empty().await);
        assert_eq!(state.queries.stats().await.total_queries, 0);
    }
}
