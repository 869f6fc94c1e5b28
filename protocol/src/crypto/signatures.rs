//! # Recoverable Authorization Signatures
//!
//! A vault never knows the controller's public key, only its [`AccountId`].
//! Verification therefore works by *recovery*: from `(message, signature)`
//! we derive the identity that signed, and the caller compares it with the
//! identity it trusts.
//!
//! Ed25519 cannot recover a key from a bare signature, so the wire format
//! carries the key alongside it:
//!
//! ```text
//! recoverable signature (96 bytes) = public_key (32) || ed25519_signature (64)
//! ```
//!
//! Recovery strictly verifies the signature with the embedded key and, if it
//! holds, returns `BLAKE3(public_key)`. Embedding the key buys nothing for an
//! attacker: a signature under their own key recovers to their own identity,
//! which the caller then rejects.
//!
//! ## Message prefixing
//!
//! The key never signs raw bytes. For a message `m` it signs
//!
//! ```text
//! SHA-256("\x19Warden Signed Message:\n" || len(m) as decimal || m)
//! ```
//!
//! so that an authorization signature cannot be lifted from, or into, any
//! other signed structure.

use std::fmt;

use thiserror::Error;

use super::hash::sha256_array;
use super::keys::{WardenKeypair, WardenPublicKey, WardenSignature};
use crate::config::{PUBLIC_KEY_LENGTH, RECOVERABLE_SIGNATURE_LENGTH, SIGNED_MESSAGE_PREFIX};
use crate::identity::AccountId;

/// Reasons signer recovery can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature blob is not exactly 96 bytes.
    #[error("malformed signature: expected {expected} bytes, got {len}")]
    MalformedSignature { expected: usize, len: usize },

    /// The embedded public key is not a valid Ed25519 point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The signature does not verify under the embedded key.
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A signature that carries enough information to recover its signer.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    public_key: WardenPublicKey,
    signature: WardenSignature,
}

impl RecoverableSignature {
    /// Parse the 96-byte wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LENGTH {
            return Err(SignatureError::MalformedSignature {
                expected: RECOVERABLE_SIGNATURE_LENGTH,
                len: bytes.len(),
            });
        }
        let (key_bytes, sig_bytes) = bytes.split_at(PUBLIC_KEY_LENGTH);

        let mut key = [0u8; 32];
        key.copy_from_slice(key_bytes);
        let public_key =
            WardenPublicKey::from_bytes(&key).map_err(|_| SignatureError::InvalidPublicKey)?;

        let mut sig = [0u8; 64];
        sig.copy_from_slice(sig_bytes);

        Ok(Self {
            public_key,
            signature: WardenSignature::from_bytes(sig),
        })
    }

    /// Parse a hex-encoded signature (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| SignatureError::MalformedSignature {
            expected: RECOVERABLE_SIGNATURE_LENGTH,
            len: s.len() / 2,
        })?;
        Self::from_bytes(&bytes)
    }

    /// The 96-byte wire form.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LENGTH] {
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
        out[..PUBLIC_KEY_LENGTH].copy_from_slice(self.public_key.as_bytes());
        out[PUBLIC_KEY_LENGTH..].copy_from_slice(self.signature.as_bytes());
        out
    }

    /// Hex-encoded wire form. 192 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The embedded public key.
    pub fn public_key(&self) -> &WardenPublicKey {
        &self.public_key
    }

    /// Recover the identity that produced this signature over `message`.
    pub fn recover(&self, message: &[u8]) -> Result<AccountId, SignatureError> {
        let hash = signed_message_hash(message);
        if !self.public_key.verify(&hash, &self.signature) {
            return Err(SignatureError::VerificationFailed);
        }
        Ok(AccountId::from_public_key(&self.public_key))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RecoverableSignature(signer={}, sig={:?})",
            AccountId::from_public_key(&self.public_key),
            self.signature
        )
    }
}

/// The 32-byte hash a key actually signs for `message`.
pub fn signed_message_hash(message: &[u8]) -> [u8; 32] {
    let len = message.len().to_string();
    sha256_array(&[SIGNED_MESSAGE_PREFIX, len.as_bytes(), message])
}

/// Sign `message` under the prefixing convention, producing a recoverable signature.
///
/// # Example
///
/// ```
/// use warden_protocol::crypto::{sign_message, recover_signer, WardenKeypair};
/// use warden_protocol::identity::AccountId;
///
/// let kp = WardenKeypair::generate();
/// let sig = sign_message(&kp, b"digest bytes");
/// let signer = recover_signer(b"digest bytes", &sig.to_bytes()).unwrap();
/// assert_eq!(signer, AccountId::from_public_key(&kp.public_key()));
/// ```
pub fn sign_message(keypair: &WardenKeypair, message: &[u8]) -> RecoverableSignature {
    let hash = signed_message_hash(message);
    RecoverableSignature {
        public_key: keypair.public_key(),
        signature: keypair.sign(&hash),
    }
}

/// Recover the signer of `message` from raw signature bytes.
///
/// This is the "bytes straight off the wire" entry point: any length,
/// any content. Malformed input is an error, never a panic.
pub fn recover_signer(message: &[u8], signature: &[u8]) -> Result<AccountId, SignatureError> {
    RecoverableSignature::from_bytes(signature)?.recover(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_recover() {
        let kp = WardenKeypair::generate();
        let sig = sign_message(&kp, b"hello");
        let signer = recover_signer(b"hello", &sig.to_bytes()).unwrap();
        assert_eq!(signer, AccountId::from_public_key(&kp.public_key()));
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = WardenKeypair::generate();
        let sig = sign_message(&kp, b"correct");
        assert_eq!(
            recover_signer(b"wrong", &sig.to_bytes()),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn test_undersized_signature_fails_cleanly() {
        for len in [0usize, 1, 64, 65, 95] {
            let bytes = vec![0xAB; len];
            assert_eq!(
                recover_signer(b"msg", &bytes),
                Err(SignatureError::MalformedSignature {
                    expected: 96,
                    len
                })
            );
        }
    }

    #[test]
    fn test_oversized_signature_fails_cleanly() {
        let kp = WardenKeypair::generate();
        let mut bytes = sign_message(&kp, b"msg").to_bytes().to_vec();
        bytes.push(0);
        assert!(matches!(
            recover_signer(b"msg", &bytes),
            Err(SignatureError::MalformedSignature { len: 97, .. })
        ));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let kp = WardenKeypair::generate();
        let mut bytes = sign_message(&kp, b"msg").to_bytes();
        bytes[PUBLIC_KEY_LENGTH + 10] ^= 0x01;
        assert!(recover_signer(b"msg", &bytes).is_err());
    }

    #[test]
    fn test_swapped_key_recovers_nothing() {
        // Pairing one key's signature with another key's bytes must not
        // recover either identity.
        let kp1 = WardenKeypair::generate();
        let kp2 = WardenKeypair::generate();
        let sig = sign_message(&kp1, b"msg").to_bytes();
        let mut forged = [0u8; 96];
        forged[..32].copy_from_slice(kp2.public_key().as_bytes());
        forged[32..].copy_from_slice(&sig[32..]);
        assert_eq!(
            recover_signer(b"msg", &forged),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn test_raw_signature_over_unprefixed_message_rejected() {
        // Signing the bare message (no prefix) must not pass recovery.
        let kp = WardenKeypair::generate();
        let raw = kp.sign(b"msg");
        let mut bytes = [0u8; 96];
        bytes[..32].copy_from_slice(kp.public_key().as_bytes());
        bytes[32..].copy_from_slice(raw.as_bytes());
        assert!(recover_signer(b"msg", &bytes).is_err());
    }

    #[test]
    fn test_prefix_binds_length() {
        assert_ne!(signed_message_hash(b"ab"), signed_message_hash(b"abc"));
        assert_ne!(signed_message_hash(b"msg"), sha256_array(&[b"msg".as_slice()]));
    }

    #[test]
    fn test_hex_roundtrip() {
        let kp = WardenKeypair::generate();
        let sig = sign_message(&kp, b"msg");
        let hex_str = sig.to_hex();
        assert_eq!(hex_str.len(), 192);
        assert_eq!(RecoverableSignature::from_hex(&hex_str).unwrap(), sig);
        let prefixed = format!("0x{}", hex_str);
        assert_eq!(RecoverableSignature::from_hex(&prefixed).unwrap(), sig);
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = WardenKeypair::generate();
        assert_eq!(sign_message(&kp, b"x"), sign_message(&kp, b"x"));
    }
}
