//! # In-Memory Host Ledger
//!
//! A flat `HashMap<AccountId, AccountState>` behind a `parking_lot::RwLock`.
//! Good enough to host vaults in tests, the CLI demo and local tooling.
//!
//! ## Transfer semantics
//!
//! A transfer `from -> to` of `A`:
//!
//! 1. Reject if `from` is frozen.
//! 2. Reject if `to` is frozen (the recipient refuses funds).
//! 3. Reject if `from.balance < A`.
//! 4. Reject if `to.balance + A` overflows.
//! 5. `from.balance -= A`, `to.balance += A`.
//!
//! All checks and both writes happen under one write lock.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{HostLedger, TransferError};
use crate::identity::{AccountId, ContextId};

/// Host-side state of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Native balance in photons.
    pub balance: u64,
    /// Frozen accounts neither send nor receive.
    pub frozen: bool,
}

impl AccountState {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }
}

/// In-memory [`HostLedger`].
pub struct InMemoryLedger {
    context: ContextId,
    accounts: RwLock<HashMap<AccountId, AccountState>>,
}

impl InMemoryLedger {
    /// Empty ledger for `context`.
    pub fn new(context: ContextId) -> Self {
        Self {
            context,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Create value out of thin air. Genesis funding for tests and demos.
    pub fn mint(&self, account: &AccountId, amount: u64) -> Result<u64, TransferError> {
        let mut accounts = self.accounts.write();
        let state = accounts.entry(*account).or_default();
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*account))?;
        Ok(state.balance)
    }

    /// Freeze an account. Frozen accounts reject incoming transfers.
    pub fn freeze(&self, account: &AccountId) {
        self.accounts.write().entry(*account).or_default().frozen = true;
    }

    pub fn unfreeze(&self, account: &AccountId) {
        if let Some(state) = self.accounts.write().get_mut(account) {
            state.frozen = false;
        }
    }

    /// Snapshot of an account's state.
    pub fn account(&self, account: &AccountId) -> Option<AccountState> {
        self.accounts.read().get(account).cloned()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    /// Sum of all balances. Transfers never change it; only `mint` does.
    pub fn total_supply(&self) -> u128 {
        self.accounts
            .read()
            .values()
            .map(|s| s.balance as u128)
            .sum()
    }
}

impl HostLedger for InMemoryLedger {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.accounts
            .read()
            .get(account)
            .map(|s| s.balance)
            .unwrap_or(0)
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        let mut accounts = self.accounts.write();

        let sender = accounts.get(from).cloned().unwrap_or_default();
        if sender.frozen {
            return Err(TransferError::SenderFrozen(*from));
        }
        let recipient = accounts.get(to).cloned().unwrap_or_default();
        if recipient.frozen {
            return Err(TransferError::RecipientRejected(*to));
        }
        if sender.balance < amount {
            return Err(TransferError::InsufficientFunds {
                available: sender.balance,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = recipient
            .balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*to))?;

        accounts.entry(*from).or_default().balance = sender.balance - amount;
        accounts.entry(*to).or_default().balance = credited;

        tracing::trace!(%from, %to, amount, "host transfer applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_label("bob")
    }

    #[test]
    fn unknown_accounts_hold_zero() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn transfer_moves_value() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 1_000).unwrap();
        ledger.transfer(&alice(), &bob(), 400).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 600);
        assert_eq!(ledger.balance_of(&bob()), 400);
        assert_eq!(ledger.total_supply(), 1_000);
    }

    #[test]
    fn transfer_insufficient_funds() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 100).unwrap();
        assert_eq!(
            ledger.transfer(&alice(), &bob(), 101),
            Err(TransferError::InsufficientFunds {
                available: 100,
                requested: 101
            })
        );
        assert_eq!(ledger.balance_of(&alice()), 100);
    }

    #[test]
    fn frozen_recipient_rejects_funds() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 100).unwrap();
        ledger.freeze(&bob());
        assert_eq!(
            ledger.transfer(&alice(), &bob(), 10),
            Err(TransferError::RecipientRejected(bob()))
        );
        ledger.unfreeze(&bob());
        ledger.transfer(&alice(), &bob(), 10).unwrap();
        assert_eq!(ledger.balance_of(&bob()), 10);
    }

    #[test]
    fn frozen_sender_cannot_send() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 100).unwrap();
        ledger.freeze(&alice());
        assert_eq!(
            ledger.transfer(&alice(), &bob(), 10),
            Err(TransferError::SenderFrozen(alice()))
        );
    }

    #[test]
    fn credit_overflow_rejected() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 10).unwrap();
        ledger.mint(&bob(), u64::MAX).unwrap();
        assert_eq!(
            ledger.transfer(&alice(), &bob(), 10),
            Err(TransferError::Overflow(bob()))
        );
        assert_eq!(ledger.balance_of(&alice()), 10);
        assert!(ledger.mint(&bob(), 1).is_err());
    }

    #[test]
    fn self_transfer_is_noop() {
        let ledger = InMemoryLedger::new(ContextId::DEVNET);
        ledger.mint(&alice(), 50).unwrap();
        ledger.transfer(&alice(), &alice(), 50).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 50);
    }
}
