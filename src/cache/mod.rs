//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! tag-based invalidation.

mod clock;
mod entry;
pub mod keys;
mod lru;
mod service;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::{CacheEntry, EntryMeta};
pub use keys::key_for;
pub use lru::LruTracker;
pub use service::CacheService;
pub use stats::{hit_rate_percent, CacheMetrics, CacheStats};
pub use store::CacheStore;
pub use tags::TagIndex;
