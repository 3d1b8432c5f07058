//! Content-addressed keys for cached request/response pairs.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request: uppercased method plus URL.
///
/// The URL is expected to be canonicalized by the caller; two requests
/// that normalize to the same method and URL share one cache entry.
pub fn entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = entry_key("GET", "https://example.com/");
        let key2 = entry_key("GET", "https://example.com/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        assert_eq!(entry_key("get", "https://example.com/"), entry_key("GET", "https://example.com/"));
    }

    #[test]
    fn test_key_different_urls() {
        assert_ne!(entry_key("GET", "https://example.com/a"), entry_key("GET", "https://example.com/b"));
    }

    #[test]
    fn test_key_different_methods() {
        assert_ne!(entry_key("GET", "https://example.com/"), entry_key("HEAD", "https://example.com/"));
    }

    #[test]
    fn test_key_format() {
        let key = entry_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
