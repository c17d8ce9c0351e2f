//! HTTP cache control module
//!
//! Provides `ETag` generation, conditional request handling and Cache-Control policies.

use crate::config::CachePolicyConfig;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate `ETag` using fast hashing
///
/// # Arguments
/// * `content` - File content
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// # Arguments
/// * `if_none_match` - Client-sent If-None-Match header
/// * `etag` - Server-computed `ETag`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        // Handle multiple ETags separated by comma
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Cache-Control policy: a shared-cache lifetime plus an immutability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime in seconds
    pub max_age: u32,
    /// Content under this key never changes
    pub immutable: bool,
}

impl CachePolicy {
    pub const fn new(max_age: u32, immutable: bool) -> Self {
        Self { max_age, immutable }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        if self.immutable {
            format!("public, max-age={}, immutable", self.max_age)
        } else {
            format!("public, max-age={}", self.max_age)
        }
    }
}

impl From<CachePolicyConfig> for CachePolicy {
    fn from(cfg: CachePolicyConfig) -> Self {
        Self::new(cfg.max_age, cfg.immutable)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(3600, false) // 1 hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(b"hello world");
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.len() > 2);
    }

    #[test]
    fn test_etag_consistency() {
        let etag1 = generate_etag(b"same content");
        let etag2 = generate_etag(b"same content");
        assert_eq!(etag1, etag2);
    }

    #[test]
    fn test_etag_difference() {
        let etag1 = generate_etag(b"content a");
        let etag2 = generate_etag(b"content b");
        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(
            CachePolicy::new(3600, false).to_header_value(),
            "public, max-age=3600"
        );
        assert_eq!(
            CachePolicy::new(31_536_000, true).to_header_value(),
            "public, max-age=31536000, immutable"
        );
        assert_eq!(
            CachePolicy::default().to_header_value(),
            "public, max-age=3600"
        );
    }

    #[test]
    fn test_cache_policy_from_config() {
        let cfg = crate::config::CacheConfig::default();
        assert_eq!(
            CachePolicy::from(cfg.image).to_header_value(),
            "public, max-age=31536000, immutable"
        );
        assert_eq!(
            CachePolicy::from(cfg.data_chunk).to_header_value(),
            "public, max-age=3600"
        );
    }
}
