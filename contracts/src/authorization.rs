//! # Authorization Construction
//!
//! The canonical withdrawal authorization and its identifier.
//!
//! ## Canonical message (version 1, 112 bytes)
//!
//! ```text
//! ┌──────────────┬──────────────┬────────────┬──────────────┬─────────────┐
//! │ vault (32)   │ recipient(32)│ amount (8) │ nonce (32)   │ context (8) │
//! └──────────────┴──────────────┴────────────┴──────────────┴─────────────┘
//!                                  u64 BE                       u64 BE
//! ```
//!
//! No delimiters, no length prefixes. The authorization id is
//! `BLAKE3(message)`; it is what the controller signs and what the replay
//! ledger records.
//!
//! Binding the vault identity stops an authorization for vault A from
//! paying out of vault B under the same controller. Binding the context id
//! stops a devnet authorization from paying out on mainnet.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_protocol::config::{
    ACCOUNT_ID_LENGTH, AMOUNT_LENGTH, AUTHORIZATION_MESSAGE_LENGTH, NONCE_LENGTH,
};
use warden_protocol::crypto::{blake3_hash, sign_message, RecoverableSignature, WardenKeypair};
use warden_protocol::identity::{AccountId, ContextId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors decoding authorization data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Input had the wrong byte length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn decode_hex_32(s: &str) -> Result<[u8; 32], MessageError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| MessageError::InvalidHex(e.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| MessageError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// Opaque 32-byte value that makes otherwise identical authorizations
/// distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_LENGTH]);

impl Nonce {
    pub const fn from_bytes(bytes: [u8; NONCE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// `BLAKE3(label)`. Lets humans name nonces (`"payout-2026-10-01"`).
    pub fn from_label(label: &str) -> Self {
        Self(blake3_hash(label.as_bytes()))
    }

    /// 32 bytes from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, MessageError> {
        decode_hex_32(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// AuthorizationId
// ---------------------------------------------------------------------------

/// BLAKE3 digest of a canonical message. The replay-ledger key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorizationId([u8; 32]);

impl AuthorizationId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, MessageError> {
        decode_hex_32(s).map(Self)
    }
}

impl fmt::Display for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorizationId({})", self.to_hex())
    }
}

impl FromStr for AuthorizationId {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for AuthorizationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AuthorizationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

// ---------------------------------------------------------------------------
// AuthorizationMessage
// ---------------------------------------------------------------------------

/// The tuple a controller approves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationMessage {
    pub vault: AccountId,
    pub recipient: AccountId,
    /// Amount in photons.
    pub amount: u64,
    pub nonce: Nonce,
    pub context: ContextId,
}

impl AuthorizationMessage {
    /// Pack into the fixed 112-byte wire form.
    pub fn encode(&self) -> [u8; AUTHORIZATION_MESSAGE_LENGTH] {
        let amount = self.amount.to_be_bytes();
        let context = self.context.to_be_bytes();

        let mut out = [0u8; AUTHORIZATION_MESSAGE_LENGTH];
        let mut offset = 0;
        for field in [
            self.vault.as_bytes().as_slice(),
            self.recipient.as_bytes().as_slice(),
            amount.as_slice(),
            self.nonce.as_bytes().as_slice(),
            context.as_slice(),
        ] {
            out[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
        out
    }

    /// Inverse of [`encode`](Self::encode). Only exact-length input is accepted.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() != AUTHORIZATION_MESSAGE_LENGTH {
            return Err(MessageError::InvalidLength {
                expected: AUTHORIZATION_MESSAGE_LENGTH,
                got: bytes.len(),
            });
        }
        let (vault, rest) = bytes.split_at(ACCOUNT_ID_LENGTH);
        let (recipient, rest) = rest.split_at(ACCOUNT_ID_LENGTH);
        let (amount, rest) = rest.split_at(AMOUNT_LENGTH);
        let (nonce, context) = rest.split_at(NONCE_LENGTH);

        let mut id = [0u8; ACCOUNT_ID_LENGTH];
        id.copy_from_slice(vault);
        let vault = AccountId::from_bytes(id);
        id.copy_from_slice(recipient);
        let recipient = AccountId::from_bytes(id);

        let mut word = [0u8; 8];
        word.copy_from_slice(amount);
        let amount = u64::from_be_bytes(word);
        word.copy_from_slice(context);
        let context = ContextId(u64::from_be_bytes(word));

        let mut n = [0u8; NONCE_LENGTH];
        n.copy_from_slice(nonce);

        Ok(Self {
            vault,
            recipient,
            amount,
            nonce: Nonce(n),
            context,
        })
    }

    /// The authorization identifier, `BLAKE3(encode())`.
    pub fn digest(&self) -> AuthorizationId {
        AuthorizationId(blake3_hash(&self.encode()))
    }
}

/// Controller-side: sign the digest of `message`.
///
/// Anyone holding the controller key can produce this; the vault only needs
/// the resulting 96 bytes.
pub fn sign_authorization(
    keypair: &WardenKeypair,
    message: &AuthorizationMessage,
) -> RecoverableSignature {
    sign_message(keypair, message.digest().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthorizationMessage {
        AuthorizationMessage {
            vault: AccountId::from_label("vault/treasury"),
            recipient: AccountId::from_label("recipient"),
            amount: 50_000_000,
            nonce: Nonce::from_label("nonce-1"),
            context: ContextId::DEVNET,
        }
    }

    #[test]
    fn layout_is_fixed() {
        let m = sample();
        let bytes = m.encode();
        assert_eq!(bytes.len(), 112);
        assert_eq!(&bytes[0..32], m.vault.as_bytes());
        assert_eq!(&bytes[32..64], m.recipient.as_bytes());
        assert_eq!(&bytes[64..72], &50_000_000u64.to_be_bytes());
        assert_eq!(&bytes[72..104], m.nonce.as_bytes());
        assert_eq!(&bytes[104..112], &ContextId::DEVNET.to_be_bytes());
    }

    #[test]
    fn decode_inverts_encode() {
        let m = sample();
        assert_eq!(AuthorizationMessage::decode(&m.encode()).unwrap(), m);
        assert_eq!(
            AuthorizationMessage::decode(&[0u8; 111]),
            Err(MessageError::InvalidLength {
                expected: 112,
                got: 111
            })
        );
    }

    #[test]
    fn every_field_changes_the_digest() {
        let base = sample();
        let d = base.digest();
        let variants = [
            AuthorizationMessage {
                vault: AccountId::from_label("vault/other"),
                ..base
            },
            AuthorizationMessage {
                recipient: AccountId::from_label("mallory"),
                ..base
            },
            AuthorizationMessage {
                amount: base.amount + 1,
                ..base
            },
            AuthorizationMessage {
                nonce: Nonce::from_label("nonce-2"),
                ..base
            },
            AuthorizationMessage {
                context: ContextId::MAINNET,
                ..base
            },
        ];
        for v in variants {
            assert_ne!(v.digest(), d);
        }
    }

    #[test]
    fn nonce_helpers() {
        assert_eq!(Nonce::from_label("n"), Nonce::from_label("n"));
        assert_ne!(Nonce::random(), Nonce::random());
        let n = Nonce::from_label("n");
        assert_eq!(Nonce::from_hex(&format!("0x{}", n.to_hex())).unwrap(), n);
        assert!(matches!(
            Nonce::from_hex("abcd"),
            Err(MessageError::InvalidLength { got: 2, .. })
        ));
        assert!(matches!(Nonce::from_hex("zz"), Err(MessageError::InvalidHex(_))));
    }

    #[test]
    fn authorization_id_serializes_as_hex() {
        let id = sample().digest();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: AuthorizationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_hex().parse::<AuthorizationId>().unwrap(), id);
    }

    #[test]
    fn signature_recovers_controller() {
        let kp = WardenKeypair::from_seed(&[5u8; 32]);
        let m = sample();
        let sig = sign_authorization(&kp, &m);
        let signer = sig.recover(m.digest().as_bytes()).unwrap();
        assert_eq!(signer, AccountId::from_public_key(&kp.public_key()));
    }
}
