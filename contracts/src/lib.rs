//! # Warden Vault Components
//!
//! A custodial vault that releases funds only against an authorization
//! signed off-chain by a single controller.
//!
//! - **Authority** ([`authority`]) holds the controller identity and checks
//!   signatures by recovering the signer.
//! - **Authorization** ([`authorization`]) builds the canonical 112-byte
//!   message and its BLAKE3 identifier.
//! - **Ledger** ([`ledger`]) records consumed identifiers, at most once each.
//! - **Vault** ([`vault`]) ties them together in the withdrawal pipeline.
//! - **Deployment** ([`deployment`]) bootstraps an authority/vault pair.
//!
//! ## Design Principles
//!
//! 1. Checks before writes. A rejected withdrawal changes nothing.
//! 2. Consume before transfer. A checked authorization is spent even if the
//!    host then refuses the transfer.
//! 3. Balances are read from the host, never mirrored.
//! 4. Signature checking is a capability ([`authority::AuthorizationVerifier`]),
//!    not a concrete dependency.

pub mod authority;
pub mod authorization;
pub mod deployment;
pub mod ledger;
pub mod vault;

pub use authority::{AuthorityError, AuthorizationAuthority, AuthorizationVerifier};
pub use authorization::{
    sign_authorization, AuthorizationId, AuthorizationMessage, MessageError, Nonce,
};
pub use deployment::{deploy, deploy_with_ledger, Deployment, DeploymentError};
pub use ledger::{AuthorizationLedger, ConsumptionRecord, ConsumptionStore, LedgerError};
pub use vault::{VaultCore, VaultError, WithdrawalReceipt};
