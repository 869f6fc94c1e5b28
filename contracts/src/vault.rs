//! # Vault Core
//!
//! Custodies value and releases it only against a controller-signed
//! authorization.
//!
//! ## Withdrawal pipeline
//!
//! ```text
//! withdraw(recipient, amount, nonce, signature)
//!   1. message = vault || recipient || amount || nonce || context
//!   2. id      = BLAKE3(message)
//!   3. authority.verify(id, signature)      ── false ──► InvalidSignature
//!   4. ledger.is_consumed(id)               ── true  ──► AuthorizationAlreadyUsed
//!   5. host.balance_of(vault) >= amount     ── false ──► InsufficientBalance
//!   6. ledger.consume(id); host.transfer()  ── fail  ──► TransferFailed (id stays burned)
//! ```
//!
//! Steps 3 to 5 never write. A rejection there leaves the ledger and all
//! balances untouched. Step 6 consumes before it transfers: once every
//! check has passed the authorization is spent, whether or not the host
//! then accepts the transfer.
//!
//! ## Concurrency
//!
//! Steps 1 to 6 run under a per-vault `Mutex`. Balance and consumption
//! reads do not take it.
//!
//! ## Balance
//!
//! There is no balance field. The custodied balance is whatever the host
//! says the vault identity holds, so deposits are ordinary host transfers
//! to [`VaultCore::identity`].

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use warden_protocol::config::format_units;
use warden_protocol::host::{HostLedger, TransferError};
use warden_protocol::identity::{AccountId, ContextId};

use crate::authority::AuthorizationVerifier;
use crate::authorization::{AuthorizationId, AuthorizationMessage, Nonce};
use crate::ledger::{AuthorizationLedger, LedgerError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a vault call failed.
#[derive(Debug, Error)]
pub enum VaultError {
    /// `initialize` was called on a vault already bound to an authority.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// `withdraw` was called before `initialize`.
    #[error("vault is not initialized")]
    NotInitialized,

    /// The signature does not recover to the controller for this exact
    /// authorization.
    #[error("invalid authorization signature")]
    InvalidSignature,

    /// This authorization has already been consumed.
    #[error("authorization {0} already used")]
    AuthorizationAlreadyUsed(AuthorizationId),

    /// The vault holds less than requested.
    #[error("insufficient vault balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    /// Every check passed and the authorization was consumed, but the host
    /// refused the transfer. The authorization is not reusable.
    #[error("transfer failed after consuming authorization {authorization_id}: {source}")]
    TransferFailed {
        authorization_id: AuthorizationId,
        #[source]
        source: TransferError,
    },

    /// The replay ledger's backing store failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl VaultError {
    /// Short machine-readable label, used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            VaultError::AlreadyInitialized => "already_initialized",
            VaultError::NotInitialized => "not_initialized",
            VaultError::InvalidSignature => "invalid_signature",
            VaultError::AuthorizationAlreadyUsed(_) => "authorization_already_used",
            VaultError::InsufficientBalance { .. } => "insufficient_balance",
            VaultError::TransferFailed { .. } => "transfer_failed",
            VaultError::Ledger(_) => "ledger",
        }
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Record of a completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub receipt_id: Uuid,
    pub authorization_id: AuthorizationId,
    pub vault: AccountId,
    pub recipient: AccountId,
    /// Amount in photons.
    pub amount: u64,
    /// Vault balance right after the transfer.
    pub remaining_balance: u64,
    pub executed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// VaultCore
// ---------------------------------------------------------------------------

/// A custodial vault bound to one authorization authority.
pub struct VaultCore {
    identity: AccountId,
    host: Arc<dyn HostLedger>,
    authority: OnceLock<Arc<dyn AuthorizationVerifier>>,
    ledger: AuthorizationLedger,
    withdraw_lock: Mutex<()>,
}

impl VaultCore {
    /// A vault with an in-memory replay ledger.
    pub fn new(identity: AccountId, host: Arc<dyn HostLedger>) -> Self {
        Self::with_ledger(identity, host, AuthorizationLedger::in_memory())
    }

    /// A vault over a caller-supplied ledger (e.g. a persistent one).
    pub fn with_ledger(
        identity: AccountId,
        host: Arc<dyn HostLedger>,
        ledger: AuthorizationLedger,
    ) -> Self {
        Self {
            identity,
            host,
            authority: OnceLock::new(),
            ledger,
            withdraw_lock: Mutex::new(()),
        }
    }

    /// Bind the vault to its authority. Callable once.
    pub fn initialize(&self, authority: Arc<dyn AuthorizationVerifier>) -> Result<(), VaultError> {
        let controller = authority.controller();
        self.authority
            .set(authority)
            .map_err(|_| VaultError::AlreadyInitialized)?;
        tracing::info!(
            vault = %self.identity,
            controller = ?controller,
            context = %self.context_id(),
            "vault initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.authority.get().is_some()
    }

    // -- Read-only ------------------------------------------------------------

    /// The vault's own identity. Send value here to deposit.
    pub fn identity(&self) -> AccountId {
        self.identity
    }

    /// Current custodied balance, read from the host.
    pub fn balance(&self) -> u64 {
        self.host.balance_of(&self.identity)
    }

    /// The controller of the bound authority.
    pub fn controller(&self) -> Option<AccountId> {
        self.authority.get().and_then(|a| a.controller())
    }

    pub fn context_id(&self) -> ContextId {
        self.host.context_id()
    }

    pub fn is_consumed(&self, id: &AuthorizationId) -> Result<bool, VaultError> {
        Ok(self.ledger.is_consumed(id)?)
    }

    pub fn ledger(&self) -> &AuthorizationLedger {
        &self.ledger
    }

    /// The canonical message this vault expects the controller to have
    /// signed for `(recipient, amount, nonce)`.
    pub fn authorization_message(
        &self,
        recipient: AccountId,
        amount: u64,
        nonce: Nonce,
    ) -> AuthorizationMessage {
        AuthorizationMessage {
            vault: self.identity,
            recipient,
            amount,
            nonce,
            context: self.context_id(),
        }
    }

    // -- Withdrawal -----------------------------------------------------------

    /// Release `amount` photons to `recipient` against a controller
    /// signature over the authorization id.
    pub fn withdraw(
        &self,
        recipient: AccountId,
        amount: u64,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<WithdrawalReceipt, VaultError> {
        let _guard = self.withdraw_lock.lock();

        let authority = self.authority.get().ok_or(VaultError::NotInitialized)?;

        let authorization_id = self.authorization_message(recipient, amount, nonce).digest();
        tracing::debug!(
            vault = %self.identity,
            %recipient,
            amount,
            %authorization_id,
            "processing withdrawal"
        );

        if !authority.verify(authorization_id.as_bytes(), signature) {
            tracing::warn!(%authorization_id, "withdrawal rejected: invalid signature");
            return Err(VaultError::InvalidSignature);
        }

        if self.ledger.is_consumed(&authorization_id)? {
            tracing::warn!(%authorization_id, "withdrawal rejected: authorization replayed");
            return Err(VaultError::AuthorizationAlreadyUsed(authorization_id));
        }

        let available = self.balance();
        if available < amount {
            tracing::warn!(
                %authorization_id,
                available,
                requested = amount,
                "withdrawal rejected: insufficient balance"
            );
            return Err(VaultError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        self.ledger
            .consume(&authorization_id, self.identity)
            .map_err(|e| match e {
                LedgerError::AlreadyConsumed(id) => VaultError::AuthorizationAlreadyUsed(id),
                other => VaultError::Ledger(other),
            })?;

        if let Err(source) = self.host.transfer(&self.identity, &recipient, amount) {
            tracing::warn!(
                %authorization_id,
                error = %source,
                "transfer failed after consumption; authorization is burned"
            );
            return Err(VaultError::TransferFailed {
                authorization_id,
                source,
            });
        }

        let remaining_balance = self.balance();
        tracing::info!(
            vault = %self.identity,
            %recipient,
            amount = %format_units(amount),
            remaining = %format_units(remaining_balance),
            %authorization_id,
            "withdrawal executed"
        );

        Ok(WithdrawalReceipt {
            receipt_id: Uuid::new_v4(),
            authorization_id,
            vault: self.identity,
            recipient,
            amount,
            remaining_balance,
            executed_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for VaultCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCore")
            .field("identity", &self.identity)
            .field("controller", &self.controller())
            .field("ledger", &self.ledger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::AuthorizationAuthority;
    use crate::authorization::sign_authorization;
    use warden_protocol::crypto::WardenKeypair;
    use warden_protocol::host::InMemoryLedger;

    struct Fixture {
        host: Arc<InMemoryLedger>,
        vault: VaultCore,
        controller: WardenKeypair,
    }

    fn fixture(funding: u64) -> Fixture {
        let host = Arc::new(InMemoryLedger::new(ContextId::DEVNET));
        let controller = WardenKeypair::from_seed(&[1u8; 32]);
        let authority = Arc::new(AuthorizationAuthority::new());
        authority
            .initialize(AccountId::from_public_key(&controller.public_key()))
            .unwrap();
        let vault = VaultCore::new(AccountId::from_label("vault/unit"), host.clone());
        vault.initialize(authority).unwrap();
        host.mint(&vault.identity(), funding).unwrap();
        Fixture {
            host,
            vault,
            controller,
        }
    }

    fn sign(f: &Fixture, recipient: AccountId, amount: u64, nonce: Nonce) -> Vec<u8> {
        let message = f.vault.authorization_message(recipient, amount, nonce);
        sign_authorization(&f.controller, &message).to_bytes().to_vec()
    }

    #[test]
    fn withdraw_happy_path() {
        let f = fixture(1_000);
        let bob = AccountId::from_label("bob");
        let nonce = Nonce::from_label("n1");
        let sig = sign(&f, bob, 400, nonce);

        let receipt = f.vault.withdraw(bob, 400, nonce, &sig).unwrap();
        assert_eq!(receipt.amount, 400);
        assert_eq!(receipt.remaining_balance, 600);
        assert_eq!(f.vault.balance(), 600);
        assert_eq!(f.host.balance_of(&bob), 400);
        assert!(f.vault.is_consumed(&receipt.authorization_id).unwrap());
    }

    #[test]
    fn uninitialized_vault_refuses() {
        let host = Arc::new(InMemoryLedger::new(ContextId::DEVNET));
        let vault = VaultCore::new(AccountId::from_label("vault/bare"), host);
        assert!(!vault.is_initialized());
        assert!(matches!(
            vault.withdraw(AccountId::from_label("bob"), 1, Nonce::from_label("n"), &[]),
            Err(VaultError::NotInitialized)
        ));
        assert!(vault.ledger().is_empty());
    }

    #[test]
    fn second_initialize_fails() {
        let f = fixture(0);
        let other = Arc::new(AuthorizationAuthority::new());
        assert!(matches!(
            f.vault.initialize(other),
            Err(VaultError::AlreadyInitialized)
        ));
        assert_eq!(
            f.vault.controller(),
            Some(AccountId::from_public_key(&f.controller.public_key()))
        );
    }

    #[test]
    fn zero_amount_consumes_authorization() {
        let f = fixture(0);
        let bob = AccountId::from_label("bob");
        let nonce = Nonce::from_label("zero");
        let sig = sign(&f, bob, 0, nonce);
        f.vault.withdraw(bob, 0, nonce, &sig).unwrap();
        assert!(matches!(
            f.vault.withdraw(bob, 0, nonce, &sig),
            Err(VaultError::AuthorizationAlreadyUsed(_))
        ));
    }

    #[test]
    fn reason_labels() {
        assert_eq!(VaultError::InvalidSignature.reason(), "invalid_signature");
        assert_eq!(
            VaultError::InsufficientBalance {
                available: 0,
                requested: 1
            }
            .reason(),
            "insufficient_balance"
        );
    }
}
