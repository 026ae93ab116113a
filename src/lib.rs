//! Tagcache - an in-process cache with tag-based invalidation
//!
//! A TTL + LRU store shared through an explicit [`CacheService`], a
//! cache-aside wrapper for expensive operations, and axum middleware that
//! caches GET responses with ETag and conditional-request handling.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheService, CacheStats, CacheStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use http::{http_cache_layer, HttpCacheOptions, HttpCacheState};
pub use query::{QueryCache, QueryOptions};
pub use tasks::spawn_purge_task;
