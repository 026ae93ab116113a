//! HTTP Module
//!
//! Response caching middleware with conditional-request support.

pub mod headers;
mod middleware;

pub use headers::{etag_for, should_revalidate, CacheControl, X_CACHE, X_CACHE_KEY};
pub use middleware::{
    http_cache_layer, request_cache_key, BypassFn, HttpCacheOptions, HttpCacheState,
};
