//! HTTP response cache middleware.
//!
//! Caches 200 responses to GET requests and serves them back with
//! `X-Cache: HIT`. Fresh responses get an ETag, `Cache-Control`,
//! `Last-Modified` and `Vary`, and are stored under the configured tags.
//!
//! ```ignore
//! let state = HttpCacheState::new(cache.clone(), HttpCacheOptions::default().with_tags(["projects"]));
//! let app = Router::new()
//!     .route("/api/projects", get(list_projects))
//!     .layer(axum::middleware::from_fn_with_state(state, http_cache_layer));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::cache::keys::{key_for, vary_segment};
use crate::cache::CacheService;
use crate::error::{CacheError, Result};
use crate::http::headers::{
    etag_for, http_date, should_revalidate, CacheControl, STALE_IF_ERROR_SECONDS, X_CACHE,
    X_CACHE_KEY,
};

/// Predicate deciding that a request skips the cache entirely.
pub type BypassFn = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Response headers never replayed from the cache.
static UNCACHED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::SET_COOKIE,
    header::CONNECTION,
];

// == Options ==
#[derive(Clone)]
pub struct HttpCacheOptions {
    /// Server-side TTL and `max-age`; 0 disables storing
    pub ttl_seconds: u64,
    pub tags: Vec<String>,
    /// Request headers folded into the key and echoed in `Vary`
    pub vary: Vec<HeaderName>,
    pub stale_while_revalidate: Option<u64>,
    /// Adds `stale-if-error=300` to `Cache-Control`
    pub revalidate_on_background: bool,
    pub key_prefix: String,
    /// Larger bodies are returned without being cached
    pub max_body_bytes: usize,
    pub bypass: Option<BypassFn>,
}

impl Default for HttpCacheOptions {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            tags: Vec::new(),
            vary: Vec::new(),
            stale_while_revalidate: None,
            revalidate_on_background: false,
            key_prefix: "api".to_string(),
            max_body_bytes: 1024 * 1024,
            bypass: None,
        }
    }
}

impl fmt::Debug for HttpCacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCacheOptions")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("tags", &self.tags)
            .field("vary", &self.vary)
            .field("stale_while_revalidate", &self.stale_while_revalidate)
            .field("revalidate_on_background", &self.revalidate_on_background)
            .field("key_prefix", &self.key_prefix)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("bypass", &self.bypass.is_some())
            .finish()
    }
}

impl HttpCacheOptions {
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn vary(mut self, name: HeaderName) -> Self {
        self.vary.push(name);
        self
    }

    pub fn stale_while_revalidate(mut self, seconds: u64) -> Self {
        self.stale_while_revalidate = Some(seconds);
        self
    }

    pub fn revalidate_on_background(mut self, enabled: bool) -> Self {
        self.revalidate_on_background = enabled;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn bypass(mut self, predicate: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.bypass = Some(Arc::new(predicate));
        self
    }

    /// `Cache-Control` for fresh responses.
    pub fn cache_control(&self) -> CacheControl {
        let stale_if_error = self
            .revalidate_on_background
            .then_some(STALE_IF_ERROR_SECONDS);
        CacheControl::new(self.ttl_seconds)
            .stale_while_revalidate(self.stale_while_revalidate)
            .stale_if_error(stale_if_error)
    }

    fn bypasses(&self, request: &Request) -> bool {
        self.bypass.as_ref().is_some_and(|predicate| predicate(request))
    }
}

// == State ==
/// Shared state handed to `from_fn_with_state`.
#[derive(Clone, Debug)]
pub struct HttpCacheState {
    pub cache: CacheService,
    pub options: Arc<HttpCacheOptions>,
}

impl HttpCacheState {
    pub fn new(cache: CacheService, options: HttpCacheOptions) -> Self {
        Self {
            cache,
            options: Arc::new(options),
        }
    }
}

// == Cached Response ==
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    /// base64 of the body bytes
    body: String,
    etag: String,
    headers: Vec<(String, String)>,
}

impl CachedResponse {
    fn capture(headers: &HeaderMap, body: &Bytes, etag: &str) -> Self {
        let headers = headers
            .iter()
            .filter(|(name, _)| !UNCACHED_HEADERS.contains(name))
            .filter(|(name, _)| **name != X_CACHE && **name != X_CACHE_KEY)
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();

        Self {
            body: STANDARD.encode(body),
            etag: etag.to_string(),
            headers,
        }
    }

    fn into_response(self, key: &str) -> Result<Response> {
        let body = STANDARD
            .decode(&self.body)
            .map_err(|err| CacheError::Corrupted(err.to_string()))?;

        let mut response = Response::new(Body::from(body));
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        mark(headers, "HIT", key);
        Ok(response)
    }
}

// == Cache Key ==
/// `<prefix>:<base64(sorted-json({method, path, query}))>[:<base64(vary)>]`.
///
/// Query parameters are percent-decoded and sorted by name; repeated
/// parameters keep their order.
pub fn request_cache_key(request: &Request, options: &HttpCacheOptions) -> Result<String> {
    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(raw) = request.uri().query() {
        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query
                .entry(name.trim().to_string())
                .or_default()
                .push(value.into_owned());
        }
    }

    let params = json!({
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "query": query,
    });
    let mut key = key_for(&options.key_prefix, &params)?;

    let vary: Vec<(String, String)> = options
        .vary
        .iter()
        .map(|name| {
            let value = request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            (name.as_str().to_string(), value.to_string())
        })
        .collect();
    if let Some(segment) = vary_segment(&vary) {
        key.push(':');
        key.push_str(&segment);
    }

    Ok(key)
}

// == Middleware ==
/// Response cache layer; mount with `axum::middleware::from_fn_with_state`.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn http_cache_layer(
    State(state): State<HttpCacheState>,
    request: Request,
    next: Next,
) -> Response {
    let options = &state.options;

    if request.method() != Method::GET || options.bypasses(&request) {
        return next.run(request).await;
    }

    let key = match request_cache_key(&request, options) {
        Ok(key) => key,
        Err(err) => {
            warn!(error = %err, "could not build response cache key, passing through");
            return next.run(request).await;
        }
    };

    if let Some(cached) = state.cache.get::<CachedResponse>(&key).await {
        if should_revalidate(request.headers(), &cached.etag, Utc::now()) {
            debug!(cache = "http", outcome = "revalidate", "conditional headers demand a fresh copy");
        } else {
            match cached.into_response(&key) {
                Ok(response) => {
                    debug!(cache = "http", outcome = "hit", "serving cached response");
                    return response;
                }
                Err(err) => {
                    warn!(error = %err, "cached response unusable, executing handler");
                    state.cache.discard_corrupted(&key).await;
                }
            }
        }
    } else {
        debug!(cache = "http", outcome = "miss", "cache miss, executing handler");
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    store_fresh(&state, key, response).await
}

/// Decorates a fresh 200 response and stores it.
async fn store_fresh(state: &HttpCacheState, key: String, response: Response) -> Response {
    let options = &state.options;
    let (mut parts, body) = response.into_parts();

    if !fits_body_limit(&body, options.max_body_bytes) {
        debug!(limit = options.max_body_bytes, "response too large or unsized, not caching");
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, options.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to read handler response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let etag = etag_for(&bytes);
    let headers = &mut parts.headers;
    insert_header(headers, header::ETAG, &etag);
    insert_header(
        headers,
        header::CACHE_CONTROL,
        &options.cache_control().to_header_value(),
    );
    insert_header(headers, header::LAST_MODIFIED, &http_date(Utc::now()));
    if !options.vary.is_empty() {
        let vary = options
            .vary
            .iter()
            .map(HeaderName::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        insert_header(headers, header::VARY, &vary);
    }

    if options.ttl_seconds > 0 {
        let cached = CachedResponse::capture(headers, &bytes, &etag);
        state
            .cache
            .set_tagged(&key, &cached, Some(options.ttl_seconds), &options.tags)
            .await;
    }

    mark(headers, "MISS", &key);
    Response::from_parts(parts, Body::from(bytes))
}

/// True when the body reports an upper bound within `limit`.
fn fits_body_limit(body: &Body, limit: usize) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|upper| upper <= limit as u64)
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "skipping unrepresentable header value"),
    }
}

fn mark(headers: &mut HeaderMap, outcome: &'static str, key: &str) {
    headers.insert(X_CACHE, HeaderValue::from_static(outcome));
    if let Ok(value) = HeaderValue::from_str(key) {
        headers.insert(X_CACHE_KEY, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn request(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn key_ignores_query_order() {
        let options = HttpCacheOptions::default();
        let a = request_cache_key(&request("/api/projects?page=2&sort=name"), &options).unwrap();
        let b = request_cache_key(&request("/api/projects?sort=name&page=2"), &options).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("api:"));
    }

    #[test]
    fn key_decodes_query_values() {
        let options = HttpCacheOptions::default();
        let a = request_cache_key(&request("/search?q=hello%20world"), &options).unwrap();
        let b = request_cache_key(&request("/search?q=hello+world"), &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_separates_paths_and_methods() {
        let options = HttpCacheOptions::default();
        let get = request_cache_key(&request("/api/projects"), &options).unwrap();
        let other = request_cache_key(&request("/api/posts"), &options).unwrap();
        let head = axum::http::Request::builder()
            .method(Method::HEAD)
            .uri("/api/projects")
            .body(Body::empty())
            .unwrap();
        assert_ne!(get, other);
        assert_ne!(get, request_cache_key(&head, &options).unwrap());
    }

    #[test]
    fn key_folds_vary_headers() {
        let options = HttpCacheOptions::default().vary(header::ACCEPT_LANGUAGE);
        let en = axum::http::Request::builder()
            .uri("/api/projects")
            .header(header::ACCEPT_LANGUAGE, "en")
            .body(Body::empty())
            .unwrap();
        let fr = axum::http::Request::builder()
            .uri("/api/projects")
            .header(header::ACCEPT_LANGUAGE, "fr")
            .body(Body::empty())
            .unwrap();

        let en_key = request_cache_key(&en, &options).unwrap();
        let fr_key = request_cache_key(&fr, &options).unwrap();
        assert_ne!(en_key, fr_key);
        assert_eq!(en_key.matches(':').count(), 2);
    }

    #[test]
    fn cache_control_from_options() {
        let options = HttpCacheOptions::default()
            .ttl(120)
            .stale_while_revalidate(30)
            .revalidate_on_background(true);
        assert_eq!(
            options.cache_control().to_header_value(),
            "max-age=120, stale-while-revalidate=30, stale-if-error=300"
        );
    }

    #[test]
    fn captured_response_replays_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("session=1"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"abc\""));

        let cached = CachedResponse::capture(&headers, &Bytes::from_static(b"[1,2]"), "\"abc\"");
        let response = cached.into_response("api:key").unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
        assert_eq!(response.headers()[X_CACHE], "HIT");
        assert_eq!(response.headers()[X_CACHE_KEY], "api:key");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn body_limit_uses_size_hint() {
        assert!(fits_body_limit(&Body::from("12345678"), 8));
        assert!(!fits_body_limit(&Body::from("123456789"), 8));
        assert!(fits_body_limit(&Body::empty(), 0));
    }

    #[tokio::test]
    async fn unreadable_cached_response_counts_as_miss() {
        let cache = CacheService::new(crate::cache::CacheStore::new(10, 300));
        let state = HttpCacheState::new(cache.clone(), HttpCacheOptions::default());
        let app = axum::Router::new()
            .route("/api/projects", axum::routing::get(|| async { "fresh" }))
            .layer(axum::middleware::from_fn_with_state(state, http_cache_layer));

        let key = request_cache_key(&request("/api/projects"), &HttpCacheOptions::default()).unwrap();
        let broken = CachedResponse {
            body: "***".to_string(),
            etag: "\"x\"".to_string(),
            headers: Vec::new(),
        };
        cache.set(&key, &broken, None).await;

        let response = app.oneshot(request("/api/projects")).await.unwrap();
        assert_eq!(response.headers()[X_CACHE], "MISS");

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deletes, 0);
        assert_eq!(stats.item_count, 1, "fresh response stored in its place");
    }

    #[test]
    fn corrupted_body_is_rejected() {
        let cached = CachedResponse {
            body: "***".to_string(),
            etag: "\"x\"".to_string(),
            headers: Vec::new(),
        };
        assert!(matches!(cached.into_response("k"), Err(CacheError::Corrupted(_))));
    }
}
