//! # Account Identities
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key)               -> AccountId
//!     -> Bech32("warden", account_id)     -> warden1...
//!
//! label (UTF-8)
//!     -> BLAKE3-derive_key(context, label) -> AccountId
//! ```
//!
//! Both derivations land in the same 32-byte space. A label-derived identity
//! has no known preimage key, so nothing can ever sign as a vault.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_HRP, ACCOUNT_ID_LENGTH, ACCOUNT_LABEL_CONTEXT};
use crate::crypto::hash::{blake3_hash, domain_separated_hash};
use crate::crypto::keys::WardenPublicKey;

/// Errors that can occur while parsing an identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The address carries an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// Not valid hex.
    #[error("invalid hex identity: {0}")]
    InvalidHex(String),

    /// The decoded payload has the wrong length.
    #[error("invalid identity length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A 32-byte account identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Identity of the holder of `pk`.
    pub fn from_public_key(pk: &WardenPublicKey) -> Self {
        Self(blake3_hash(pk.as_bytes()))
    }

    /// Identity for a keyless component, derived from a label such as
    /// `"vault/treasury"`.
    pub fn from_label(label: &str) -> Self {
        Self(domain_separated_hash(ACCOUNT_LABEL_CONTEXT, label.as_bytes()))
    }

    /// Wrap raw identity bytes.
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw identity bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Bech32 address, `warden1...`.
    pub fn to_address(&self) -> String {
        let hrp = Hrp::parse(ACCOUNT_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.0)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parse a Bech32 address. Validates prefix, checksum and length.
    pub fn from_address(addr: &str) -> Result<Self, IdentityError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| IdentityError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ACCOUNT_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(IdentityError::InvalidHrp {
                expected: ACCOUNT_HRP.to_string(),
                got: hrp.to_string(),
            });
        }
        Self::from_slice(&data)
    }

    /// Parse a hex identity (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Hex encoding, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; ACCOUNT_ID_LENGTH] =
            bytes.try_into().map_err(|_| IdentityError::InvalidLength {
                expected: ACCOUNT_ID_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl FromStr for AccountId {
    type Err = IdentityError;

    /// Accepts either a Bech32 address or hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with(ACCOUNT_HRP) {
            Self::from_address(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_address())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            Ok(Self(<[u8; ACCOUNT_ID_LENGTH]>::deserialize(deserializer)?))
        }
    }
}
