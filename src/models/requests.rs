//! Request DTOs for the maintenance API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for pattern invalidation (POST /cache/invalidate/pattern)
///
/// # Fields
/// - `pattern`: `prefix*` or an exact key
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    pub pattern: String,
}

impl InvalidatePatternRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let pattern = self.pattern.trim();
        if pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if pattern.strip_suffix('*').unwrap_or(pattern).contains('*') {
            return Some("Only a single trailing '*' wildcard is supported".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(pattern: &str) -> InvalidatePatternRequest {
        InvalidatePatternRequest {
            pattern: pattern.to_string(),
        }
    }

    #[test]
    fn test_deserialize() {
        let req: InvalidatePatternRequest =
            serde_json::from_str(r#"{"pattern": "api:*"}"#).unwrap();
        assert_eq!(req.pattern, "api:*");
    }

    #[test]
    fn test_validate_empty_pattern() {
        assert!(req("").validate().is_some());
        assert!(req("   ").validate().is_some());
    }

    #[test]
    fn test_validate_inner_wildcard() {
        assert!(req("api:*:posts").validate().is_some());
        assert!(req("**").validate().is_some());
    }

    #[test]
    fn test_validate_multibyte_patterns() {
        assert!(req("café").validate().is_none());
        assert!(req("post:é*").validate().is_none());
        assert!(req("é*é*").validate().is_some());
    }

    #[test]
    fn test_validate_valid_patterns() {
        assert!(req("api:*").validate().is_none());
        assert!(req("*").validate().is_none());
        assert!(req("getBlogPosts:bnVsbA==").validate().is_none());
    }
}
