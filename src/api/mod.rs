//! API Module
//!
//! HTTP handlers and routing for the cache maintenance API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Store and query statistics
//! - `GET /cache/entries/:key` - Entry metadata and tags
//! - `POST /cache/invalidate/tag/:tag` - Drop every entry under a tag
//! - `POST /cache/invalidate/pattern` - Drop tracked keys matching `prefix*`
//! - `POST /cache/purge` - Remove expired entries now
//! - `DELETE /cache` - Clear everything

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
