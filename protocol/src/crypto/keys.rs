//! # Key Management
//!
//! Ed25519 keypairs for Warden controllers.
//!
//! A controller's keypair is the only thing that can release vault funds, so
//! the usual rules apply: private keys are zeroized on drop (ed25519-dalek
//! does that for us), generated from `OsRng`, and never logged. The `Debug`
//! impl prints the public key only.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* parsing failed.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// An Ed25519 signing keypair.
///
/// Intentionally not `Serialize`: exporting a secret should be an explicit
/// call to [`secret_key_bytes`](Self::secret_key_bytes), not a side effect of
/// dumping a struct to JSON.
///
/// # Examples
///
/// ```
/// use warden_protocol::crypto::WardenKeypair;
///
/// let kp = WardenKeypair::generate();
/// let sig = kp.sign(b"release 0.5 to bob");
/// assert!(kp.public_key().verify(b"release 0.5 to bob", &sig));
/// ```
pub struct WardenKeypair {
    signing_key: SigningKey,
}

/// The public half of a keypair.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WardenPublicKey {
    bytes: [u8; 32],
}

/// A raw 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct WardenSignature {
    bytes: [u8; 64],
}

impl WardenKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the seed *is* the secret key. Weak seed, weak key.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    ///
    /// This is how the CLI loads a controller key from `WARDEN_CONTROLLER_KEY`.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// The public key for this keypair.
    pub fn public_key(&self) -> WardenPublicKey {
        WardenPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> WardenSignature {
        WardenSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Export the raw 32-byte secret key. Handle with extreme care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl Clone for WardenKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for WardenKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WardenKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// WardenPublicKey
// ---------------------------------------------------------------------------

impl WardenPublicKey {
    /// Parse a public key, rejecting bytes that are not a valid curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes: *bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Strictly verify `signature` over `message`.
    ///
    /// Strict verification rejects small-order keys and non-canonical
    /// signature encodings that the lenient check would accept.
    pub fn verify(&self, message: &[u8], signature: &WardenSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify_strict(message, &sig).is_ok()
    }

    /// Hex-encoded representation. 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Base58-encoded representation.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl fmt::Display for WardenPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for WardenPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WardenPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// WardenSignature
// ---------------------------------------------------------------------------

impl WardenSignature {
    /// Wrap raw signature bytes. Validity is only known at verification time.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}

impl fmt::Debug for WardenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = hex::encode(self.bytes);
        write!(f, "WardenSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = WardenKeypair::generate();
        let sig = kp.sign(b"release funds");
        assert!(kp.public_key().verify(b"release funds", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = WardenKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.public_key().verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = WardenKeypair::generate();
        let kp2 = WardenKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn test_roundtrip_hex() {
        let kp = WardenKeypair::generate();
        let restored = WardenKeypair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(WardenKeypair::from_hex("deadbeef").is_err());
        assert!(WardenKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = WardenKeypair::from_seed(&seed);
        let kp2 = WardenKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.sign(b"x"), kp2.sign(b"x"));
    }

    #[test]
    fn strict_verification_rejects_small_order_key() {
        // The identity point decodes fine but is a small-order key.
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let pk = WardenPublicKey::from_bytes(&identity).unwrap();
        let mut sig_bytes = [0u8; 64];
        sig_bytes[0] = 1;
        let sig = WardenSignature::from_bytes(sig_bytes);
        assert!(!pk.verify(b"anything", &sig));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = WardenKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("WardenKeypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_key_bytes())));
    }

    #[test]
    fn public_key_encodings() {
        let pk = WardenKeypair::generate().public_key();
        assert_eq!(pk.to_hex().len(), 64);
        let b58 = pk.to_base58();
        assert!(b58.len() >= 42 && b58.len() <= 46);
    }
}
