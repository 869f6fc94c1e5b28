//! # Hashing Utilities
//!
//! Two hash functions, each with a fixed job:
//!
//! - **BLAKE3**: authorization digests, label-derived nonces and account
//!   identities. Native Warden structures always use BLAKE3.
//! - **SHA-256**: the prefixed signed-message hash that the controller's
//!   key actually signs.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the concatenation of `parts`.
///
/// Parts are fed into the hasher one after another, so callers can hash a
/// prefix and a payload without building a temporary buffer.
pub fn sha256_array(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use warden_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"nonce-1");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// Two different contexts never collide even over identical data, because
/// the context string selects a different internal IV.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        let hash = sha256_array(&[]);
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn sha256_parts_equal_concatenation() {
        let split = sha256_array(&[b"hello".as_slice(), b" world".as_slice()]);
        let joined = sha256_array(&[b"hello world".as_slice()]);
        assert_eq!(split, joined);
    }

    #[test]
    fn blake3_deterministic() {
        assert_eq!(blake3_hash(b"warden"), blake3_hash(b"warden"));
        assert_ne!(blake3_hash(b"warden"), blake3_hash(b"Warden"));
    }

    #[test]
    fn test_domain_separation() {
        let data = b"same data";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
        assert_ne!(a, blake3_hash(data));
    }
}
