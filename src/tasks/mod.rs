//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Purge: removes expired cache entries at the configured interval

mod purge;

pub use purge::spawn_purge_task;
