//! # Identity Module
//!
//! Who is who, and where.
//!
//! - [`AccountId`]: a 32-byte identity. For key holders it is the BLAKE3
//!   hash of their Ed25519 public key; for components that hold no key
//!   (vaults, authorities) it is derived from a label. Displayed as Bech32
//!   with the `warden` prefix.
//! - [`ContextId`]: the execution environment (mainnet, testnet, devnet or
//!   a custom domain) an authorization is bound to.

pub mod account;
pub mod context;

pub use account::{AccountId, IdentityError};
pub use context::ContextId;
