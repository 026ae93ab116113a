//! API Routes
//!
//! Configures the Axum router with the cache maintenance endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, entry_handler, health_handler, invalidate_pattern_handler,
    invalidate_tag_handler, purge_handler, stats_handler, AppState,
};

/// Creates the maintenance router.
///
/// # Endpoints
/// - `GET /health`
/// - `GET /cache/stats`
/// - `GET /cache/entries/:key`
/// - `POST /cache/invalidate/tag/:tag`
/// - `POST /cache/invalidate/pattern`
/// - `POST /cache/purge`
/// - `DELETE /cache`
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/entries/:key", get(entry_handler))
        .route("/cache/invalidate/tag/:tag", post(invalidate_tag_handler))
        .route("/cache/invalidate/pattern", post(invalidate_pattern_handler))
        .route("/cache/purge", post(purge_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let app = create_router(AppState::new(CacheStore::new(100, 300)));
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_maintenance_routes_respond() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/cache/stats").await, StatusCode::OK);
        assert_eq!(status_of("POST", "/cache/purge").await, StatusCode::OK);
        assert_eq!(status_of("POST", "/cache/invalidate/tag/blogs").await, StatusCode::OK);
        assert_eq!(status_of("DELETE", "/cache").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mutations_require_their_method() {
        assert_eq!(status_of("GET", "/cache/purge").await, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(status_of("GET", "/cache").await, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            status_of("GET", "/cache/invalidate/tag/blogs").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_entry_not_found() {
        assert_eq!(status_of("GET", "/cache/entries/nonexistent").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pattern_without_body_is_rejected() {
        let status = status_of("POST", "/cache/invalidate/pattern").await;
        assert!(status.is_client_error());
    }
}
