//! Cache-related HTTP header helpers.
//!
//! Builds `Cache-Control` values and ETags, formats and parses HTTP dates,
//! and decides whether a conditional request must be re-executed.

use axum::http::{header, HeaderMap, HeaderName};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

// == Constants ==
/// `stale-if-error` advertised when background revalidation is enabled.
pub const STALE_IF_ERROR_SECONDS: u64 = 300;

/// An `If-Modified-Since` older than this forces re-execution.
pub const IF_MODIFIED_SINCE_WINDOW_SECONDS: i64 = 60;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");

// == Cache-Control ==
/// The directives this middleware emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: u64,
    pub stale_while_revalidate: Option<u64>,
    pub stale_if_error: Option<u64>,
}

impl CacheControl {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }

    pub fn stale_while_revalidate(mut self, seconds: Option<u64>) -> Self {
        self.stale_while_revalidate = seconds;
        self
    }

    pub fn stale_if_error(mut self, seconds: Option<u64>) -> Self {
        self.stale_if_error = seconds;
        self
    }

    /// `max-age=<n>[, stale-while-revalidate=<n>][, stale-if-error=<n>]`,
    /// or `no-cache` when max-age is 0.
    pub fn to_header_value(&self) -> String {
        if self.max_age == 0 {
            return "no-cache".to_string();
        }

        let mut directives = vec![format!("max-age={}", self.max_age)];
        if let Some(swr) = self.stale_while_revalidate {
            directives.push(format!("stale-while-revalidate={swr}"));
        }
        if let Some(sie) = self.stale_if_error {
            directives.push(format!("stale-if-error={sie}"));
        }
        directives.join(", ")
    }
}

// == ETag ==
/// Strong ETag for a body: the first 128 bits of its SHA-256, hex, quoted.
pub fn etag_for(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&digest[..16]))
}

// == HTTP Dates ==
/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

// == Revalidation ==
/// Whether a cached response must be regenerated for this request.
///
/// - `If-None-Match` present and not matching `cached_etag` → true
/// - `If-Modified-Since` present and older than 60 s, or unreadable → true
/// - neither header → false; the server-side copy is served
pub fn should_revalidate(headers: &HeaderMap, cached_etag: &str, now: DateTime<Utc>) -> bool {
    if let Some(value) = headers.get(header::IF_NONE_MATCH) {
        let matches = value
            .to_str()
            .is_ok_and(|candidates| etag_matches(candidates, cached_etag));
        if !matches {
            return true;
        }
    }

    if let Some(value) = headers.get(header::IF_MODIFIED_SINCE) {
        let since = value.to_str().ok().and_then(parse_http_date);
        match since {
            Some(since) if now - since <= Duration::seconds(IF_MODIFIED_SINCE_WINDOW_SECONDS) => {}
            _ => return true,
        }
    }

    false
}

/// `If-None-Match` list matching, ignoring weak prefixes.
fn etag_matches(candidates: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    candidates
        .split(',')
        .map(|candidate| candidate.trim().trim_start_matches("W/"))
        .any(|candidate| candidate == "*" || candidate == etag)
}
