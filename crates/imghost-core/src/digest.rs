//! Content digests
//!
//! A digest is the SHA-256 of a blob's bytes rendered as 64 lowercase hex
//! characters. It is the identity of a stored image: the public store names
//! files `{digest}.{ext}`, so two uploads with identical bytes land on the
//! same file.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 content digest (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the digest of in-memory bytes.
    pub fn of(data: &[u8]) -> Self {
        ContentDigest(hex::encode(Sha256::digest(data)))
    }

    /// Parse a digest received from outside (e.g. a URL segment).
    ///
    /// Returns `None` unless the input is exactly 64 hex characters. Uppercase
    /// input is normalized to lowercase.
    pub fn parse(input: &str) -> Option<Self> {
        if input.len() != DIGEST_HEX_LEN || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(ContentDigest(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash a blob. Same bytes always yield the same digest.
pub fn hash(data: &[u8]) -> ContentDigest {
    ContentDigest::of(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let data = b"the same bytes, hashed twice";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn test_hash_known_value() {
        assert_eq!(
            hash(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_one_byte_difference_changes_digest() {
        let a = b"image payload 0".to_vec();
        let mut b = a.clone();
        *b.last_mut().unwrap() = b'1';
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_parse_accepts_valid_digest() {
        let digest = hash(b"payload");
        assert_eq!(ContentDigest::parse(digest.as_str()), Some(digest.clone()));
        assert_eq!(
            ContentDigest::parse(&digest.as_str().to_uppercase()),
            Some(digest)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(ContentDigest::parse("").is_none());
        assert!(ContentDigest::parse("abc123").is_none());
        assert!(ContentDigest::parse(&"g".repeat(64)).is_none());
        assert!(ContentDigest::parse(&format!("../{}", "a".repeat(61))).is_none());
    }
}
