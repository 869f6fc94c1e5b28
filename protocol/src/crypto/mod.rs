//! # Cryptographic Primitives for Warden
//!
//! Everything the authorization protocol needs and nothing more:
//!
//! - **Ed25519** for controller signatures.
//! - **BLAKE3** for authorization digests, nonces and identities.
//! - **SHA-256** for the prefixed signed-message hash.
//!
//! All of it is a thin, typed layer over audited crates. Nothing here is
//! hand-rolled.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, domain_separated_hash, sha256_array};
pub use keys::{WardenKeypair, WardenPublicKey, WardenSignature};
pub use signatures::{
    recover_signer, sign_message, signed_message_hash, RecoverableSignature, SignatureError,
};
