//! Cache key construction.
//!
//! Keys have the shape `<prefix>:<base64(sorted-json(params))>`. JSON object
//! keys come out sorted because `serde_json::Value` maps are ordered, so two
//! parameter sets that differ only in field order share a key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::error::Result;

/// Builds `<prefix>:<base64(sorted-json(params))>`.
pub fn key_for<P: Serialize + ?Sized>(prefix: &str, params: &P) -> Result<String> {
    let value = serde_json::to_value(params)?;
    let json = serde_json::to_string(&value)?;
    Ok(format!("{prefix}:{}", STANDARD.encode(json)))
}

/// Encodes selected header values as `base64("name:value|name:value")`.
///
/// Returns None when there is nothing to fold into the key.
pub fn vary_segment(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }
    let joined = pairs
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("|");
    Some(STANDARD.encode(joined))
}
