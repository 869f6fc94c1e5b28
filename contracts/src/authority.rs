//! # Authorization Authority
//!
//! Holds the one identity allowed to approve withdrawals and answers a
//! single question: *did that identity sign this exact message?*
//!
//! The vault does not depend on this struct directly. It depends on the
//! [`AuthorizationVerifier`] capability, so an alternative signature scheme
//! or a test double can stand in for it.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──initialize(controller)──► Initialized(controller)   (terminal)
//!                │
//!                └── second initialize ──► AlreadyInitialized
//! ```
//!
//! The controller lives in a `OnceLock`: racing initializers resolve to
//! exactly one winner and the value can never change afterwards.

use std::sync::OnceLock;

use thiserror::Error;
use warden_protocol::crypto::{recover_signer, SignatureError};
use warden_protocol::identity::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by authority setup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// `initialize` was called on an authority that already has a controller.
    #[error("authorization authority is already initialized")]
    AlreadyInitialized,
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Signature-checking capability injected into a vault.
pub trait AuthorizationVerifier: Send + Sync {
    /// `true` iff `signature` over `message` was produced by the controller.
    ///
    /// Must not panic on malformed input; a bad signature is just `false`.
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;

    /// The trusted identity, once known.
    fn controller(&self) -> Option<AccountId>;
}

// ---------------------------------------------------------------------------
// AuthorizationAuthority
// ---------------------------------------------------------------------------

/// The single-controller signature authority.
#[derive(Debug, Default)]
pub struct AuthorizationAuthority {
    controller: OnceLock<AccountId>,
}

impl AuthorizationAuthority {
    /// An authority with no controller yet. It verifies nothing until
    /// [`initialize`](Self::initialize) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the trusted signer for the lifetime of this authority.
    pub fn initialize(&self, controller: AccountId) -> Result<(), AuthorityError> {
        self.controller
            .set(controller)
            .map_err(|_| AuthorityError::AlreadyInitialized)?;
        tracing::info!(%controller, "authorization authority initialized");
        Ok(())
    }

    pub fn controller(&self) -> Option<AccountId> {
        self.controller.get().copied()
    }

    pub fn is_initialized(&self) -> bool {
        self.controller.get().is_some()
    }

    /// Recover whoever signed `message`, regardless of whether it is the
    /// controller. Diagnostics only; use `verify` for decisions.
    pub fn recover(&self, message: &[u8], signature: &[u8]) -> Result<AccountId, SignatureError> {
        recover_signer(message, signature)
    }
}

impl AuthorizationVerifier for AuthorizationAuthority {
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Some(controller) = self.controller.get() else {
            tracing::debug!("verify called on uninitialized authority");
            return false;
        };
        match recover_signer(message, signature) {
            Ok(signer) if &signer == controller => true,
            Ok(signer) => {
                tracing::debug!(%signer, "signature recovered to a non-controller identity");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "signer recovery failed");
                false
            }
        }
    }

    fn controller(&self) -> Option<AccountId> {
        self.controller.get().copied()
    }
}
