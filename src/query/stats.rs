//! Query Statistics Module
//!
//! Per-operation execution statistics for the cache-aside wrapper.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Constants ==
/// Executions slower than this many milliseconds are logged as slow by default.
pub const DEFAULT_SLOW_QUERY_THRESHOLD_MS: u64 = 100;

/// Slow executions kept per operation name.
pub const SLOW_QUERY_LOG_CAPACITY: usize = 100;

/// Entries returned in the summary's `slowest` list.
pub const SLOWEST_REPORTED: usize = 10;

// == Slow Query ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQuery {
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

// == Query Stats ==
/// Statistics for a single operation name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryStats {
    /// Every run, cache hits included
    pub count: u64,
    /// Runs answered from the cache
    pub cache_hits: u64,
    /// Wall-clock time spent executing (cache hits excluded)
    pub total_execution_time_ms: u64,
    /// Most recent slow executions, oldest first
    pub slow_queries: VecDeque<SlowQuery>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.count += 1;
        self.cache_hits += 1;
    }

    // == Record Execution ==
    /// Counts an execution and logs it if it took longer than `threshold_ms`.
    pub fn record_execution(&mut self, execution_time_ms: u64, threshold_ms: u64) {
        self.count += 1;
        self.total_execution_time_ms += execution_time_ms;

        if execution_time_ms > threshold_ms {
            if self.slow_queries.len() == SLOW_QUERY_LOG_CAPACITY {
                self.slow_queries.pop_front();
            }
            self.slow_queries.push_back(SlowQuery {
                execution_time_ms,
                timestamp: Utc::now(),
            });
        }
    }

    /// Runs that actually executed the operation.
    pub fn executions(&self) -> u64 {
        self.count - self.cache_hits
    }

    pub fn average_execution_time_ms(&self) -> f64 {
        match self.executions() {
            0 => 0.0,
            n => self.total_execution_time_ms as f64 / n as f64,
        }
    }
}

// == Summary Types ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQueryRecord {
    pub name: String,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSummary {
    pub count: u64,
    pub cache_hits: u64,
    pub total_execution_time_ms: u64,
    pub average_execution_time_ms: f64,
    pub slow_query_count: usize,
}

/// Aggregate view over every operation name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryStatsSummary {
    pub total_queries: u64,
    pub cache_hits: u64,
    pub total_execution_time_ms: u64,
    /// Mean over executed runs; cache hits are not timed
    pub average_execution_time_ms: f64,
    /// Hit rate of the underlying store
    pub cache_hit_rate_percent: f64,
    /// The ten slowest recorded executions across all names, slowest first
    pub slowest: Vec<SlowQueryRecord>,
    pub operations: BTreeMap<String, OperationSummary>,
}

// == Summarize ==
/// Folds per-operation stats into a summary.
pub fn summarize(
    stats: &HashMap<String, QueryStats>,
    cache_hit_rate_percent: f64,
) -> QueryStatsSummary {
    let mut summary = QueryStatsSummary {
        cache_hit_rate_percent,
        ..QueryStatsSummary::default()
    };
    let mut executions = 0u64;

    for (name, op) in stats {
        summary.total_queries += op.count;
        summary.cache_hits += op.cache_hits;
        summary.total_execution_time_ms += op.total_execution_time_ms;
        executions += op.executions();

        summary.slowest.extend(op.slow_queries.iter().map(|slow| SlowQueryRecord {
            name: name.clone(),
            execution_time_ms: slow.execution_time_ms,
            timestamp: slow.timestamp,
        }));

        summary.operations.insert(
            name.clone(),
            OperationSummary {
                count: op.count,
                cache_hits: op.cache_hits,
                total_execution_time_ms: op.total_execution_time_ms,
                average_execution_time_ms: op.average_execution_time_ms(),
                slow_query_count: op.slow_queries.len(),
            },
        );
    }

    if executions > 0 {
        summary.average_execution_time_ms =
            summary.total_execution_time_ms as f64 / executions as f64;
    }

    summary.slowest.sort_by(|a, b| {
        b.execution_time_ms
            .cmp(&a.execution_time_ms)
            .then_with(|| a.name.cmp(&b.name))
    });
    summary.slowest.truncate(SLOWEST_REPORTED);

    summary
}
