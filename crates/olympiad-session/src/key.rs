//! Cache key derivation.

use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Derive the cache key for a credential token.
///
/// Keys are the lowercase hex SHA-256 of the token so that bearer tokens
/// never sit in the cache (or in a shared cache backend) verbatim.
pub fn cache_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable() {
        assert_eq!(cache_key("token-a"), cache_key("token-a"));
    }

    #[test]
    fn test_distinct_tokens_distinct_keys() {
        assert_ne!(cache_key("token-a"), cache_key("token-b"));
    }

    #[test]
    fn test_key_does_not_contain_token() {
        let key = cache_key("super-secret-jwt");
        assert_eq!(key.len(), 64);
        assert!(!key.contains("secret"));
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            cache_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
