//! Query Module
//!
//! Cache-aside wrapper for named async operations with per-operation
//! performance statistics.

mod runner;
pub mod stats;

pub use runner::{QueryCache, QueryOptions};
pub use stats::{
    OperationSummary, QueryStats, QueryStatsSummary, SlowQuery, SlowQueryRecord,
    DEFAULT_SLOW_QUERY_THRESHOLD_MS, SLOW_QUERY_LOG_CAPACITY,
};
