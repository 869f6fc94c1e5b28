//! # Host Ledger
//!
//! The vault does not keep books. Balances live in whatever environment hosts
//! the vault (a chain, a payment rail, a test double), and the vault talks to
//! it through two primitives: *read a balance* and *move value*.
//!
//! ```text
//! state.rs    InMemoryLedger, HashMap-backed host for tests, demos and tooling
//! ```
//!
//! A vault's custodied balance is always `host.balance_of(vault_identity)`.
//! Deposits are ordinary transfers into that identity; there is no separate
//! counter that could drift from what the host actually holds.

pub mod state;

use thiserror::Error;

use crate::identity::{AccountId, ContextId};

pub use state::{AccountState, InMemoryLedger};

/// Why the host refused a transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The sender does not hold enough.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: u64, requested: u64 },

    /// The recipient refuses incoming value (e.g. a frozen account).
    #[error("recipient {0} rejected the transfer")]
    RecipientRejected(AccountId),

    /// The sender is frozen and cannot move value.
    #[error("sender {0} is frozen")]
    SenderFrozen(AccountId),

    /// Crediting the recipient would overflow `u64`.
    #[error("balance overflow crediting {0}")]
    Overflow(AccountId),
}

/// The primitives a vault needs from its execution environment.
///
/// Implementations must make `transfer` atomic: either both sides move or
/// neither does. `balance_of` must not block behind a vault's withdrawal
/// lock.
pub trait HostLedger: Send + Sync {
    /// The execution context this host represents.
    fn context_id(&self) -> ContextId;

    /// Current native balance of `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &AccountId) -> u64;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64)
        -> Result<(), TransferError>;
}
