//! # Authorization Ledger
//!
//! The replay-protection set: every [`AuthorizationId`] a vault has ever
//! honoured. Append-only, unbounded, no eviction.
//!
//! Storage sits behind [`ConsumptionStore`]:
//!
//! | Store                      | Backing           | Atomic insert               |
//! |----------------------------|-------------------|-----------------------------|
//! | [`MemoryConsumptionStore`] | `DashMap`         | `entry()` under shard lock  |
//! | [`SledConsumptionStore`]   | sled `consumed`   | `compare_and_swap(None, _)` |
//!
//! Both make "check absent, then insert" a single operation, so two callers
//! racing on the same id can never both succeed, even without the vault's
//! withdrawal lock.

use std::path::Path;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use warden_protocol::identity::AccountId;
use warden_protocol::storage::{DbError, WardenDB};

pub use warden_protocol::storage::ConsumptionRecord;

use crate::authorization::AuthorizationId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the replay ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The id has been consumed before.
    #[error("authorization {0} already consumed")]
    AlreadyConsumed(AuthorizationId),

    /// The backing store failed.
    #[error("ledger storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("ledger serialization error: {0}")]
    Serialization(String),
}

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Serialization(msg) => LedgerError::Serialization(msg),
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Backing set for consumed ids.
pub trait ConsumptionStore: Send + Sync {
    fn contains(&self, id: &AuthorizationId) -> Result<bool, LedgerError>;

    /// Insert `record` under `id` unless present. `Ok(true)` if inserted.
    fn insert_if_absent(
        &self,
        id: &AuthorizationId,
        record: &ConsumptionRecord,
    ) -> Result<bool, LedgerError>;

    fn get(&self, id: &AuthorizationId) -> Result<Option<ConsumptionRecord>, LedgerError>;

    fn len(&self) -> usize;
}

/// In-process store. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryConsumptionStore {
    consumed: DashMap<AuthorizationId, ConsumptionRecord>,
}

impl MemoryConsumptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsumptionStore for MemoryConsumptionStore {
    fn contains(&self, id: &AuthorizationId) -> Result<bool, LedgerError> {
        Ok(self.consumed.contains_key(id))
    }

    fn insert_if_absent(
        &self,
        id: &AuthorizationId,
        record: &ConsumptionRecord,
    ) -> Result<bool, LedgerError> {
        match self.consumed.entry(*id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    fn get(&self, id: &AuthorizationId) -> Result<Option<ConsumptionRecord>, LedgerError> {
        Ok(self.consumed.get(id).map(|r| r.value().clone()))
    }

    fn len(&self) -> usize {
        self.consumed.len()
    }
}

/// sled-backed store. Survives restarts.
#[derive(Debug, Clone)]
pub struct SledConsumptionStore {
    db: WardenDB,
}

impl SledConsumptionStore {
    pub fn new(db: WardenDB) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &WardenDB {
        &self.db
    }
}

impl ConsumptionStore for SledConsumptionStore {
    fn contains(&self, id: &AuthorizationId) -> Result<bool, LedgerError> {
        Ok(self.db.contains_consumed(id.as_bytes())?)
    }

    fn insert_if_absent(
        &self,
        id: &AuthorizationId,
        record: &ConsumptionRecord,
    ) -> Result<bool, LedgerError> {
        Ok(self.db.insert_consumed(id.as_bytes(), record)?)
    }

    fn get(&self, id: &AuthorizationId) -> Result<Option<ConsumptionRecord>, LedgerError> {
        Ok(self.db.get_consumed(id.as_bytes())?)
    }

    fn len(&self) -> usize {
        self.db.consumed_count()
    }
}

// ---------------------------------------------------------------------------
// AuthorizationLedger
// ---------------------------------------------------------------------------

/// At-most-once consumption of authorization ids.
pub struct AuthorizationLedger {
    store: Box<dyn ConsumptionStore>,
}

impl AuthorizationLedger {
    pub fn new(store: Box<dyn ConsumptionStore>) -> Self {
        Self { store }
    }

    /// Volatile ledger.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryConsumptionStore::new()))
    }

    /// Persistent ledger at `path`, bound to `vault`.
    ///
    /// Refuses a database previously bound to a different vault.
    pub fn open<P: AsRef<Path>>(path: P, vault: &AccountId) -> Result<Self, LedgerError> {
        let db = WardenDB::open(path)?;
        Self::persistent(db, vault)
    }

    /// Persistent ledger over an already-open database.
    pub fn persistent(db: WardenDB, vault: &AccountId) -> Result<Self, LedgerError> {
        db.bind_vault(vault)?;
        Ok(Self::new(Box::new(SledConsumptionStore::new(db))))
    }

    pub fn is_consumed(&self, id: &AuthorizationId) -> Result<bool, LedgerError> {
        self.store.contains(id)
    }

    /// Record `id` as consumed by `vault`.
    ///
    /// Fails with [`LedgerError::AlreadyConsumed`] if it already was. The
    /// check and the insert are one atomic step.
    pub fn consume(
        &self,
        id: &AuthorizationId,
        vault: AccountId,
    ) -> Result<ConsumptionRecord, LedgerError> {
        let record = ConsumptionRecord::now(vault);
        if !self.store.insert_if_absent(id, &record)? {
            return Err(LedgerError::AlreadyConsumed(*id));
        }
        tracing::debug!(authorization_id = %id, "authorization consumed");
        Ok(record)
    }

    /// When and by whom `id` was consumed.
    pub fn record(&self, id: &AuthorizationId) -> Result<Option<ConsumptionRecord>, LedgerError> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuthorizationLedger {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for AuthorizationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationLedger")
            .field("consumed", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> AuthorizationId {
        AuthorizationId::from_bytes([n; 32])
    }

    fn vault() -> AccountId {
        AccountId::from_label("vault/ledger-test")
    }

    fn exercise(ledger: &AuthorizationLedger) {
        assert!(ledger.is_empty());
        assert!(!ledger.is_consumed(&id(1)).unwrap());

        let record = ledger.consume(&id(1), vault()).unwrap();
        assert_eq!(record.vault, vault());
        assert!(ledger.is_consumed(&id(1)).unwrap());
        assert_eq!(ledger.record(&id(1)).unwrap(), Some(record));

        assert_eq!(
            ledger.consume(&id(1), vault()),
            Err(LedgerError::AlreadyConsumed(id(1)))
        );
        assert!(!ledger.is_consumed(&id(2)).unwrap());
        ledger.consume(&id(2), vault()).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn memory_ledger_consumes_once() {
        exercise(&AuthorizationLedger::in_memory());
    }

    #[test]
    fn sled_ledger_consumes_once() {
        let db = WardenDB::open_temporary().unwrap();
        exercise(&AuthorizationLedger::persistent(db, &vault()).unwrap());
    }

    #[test]
    fn sled_ledger_rejects_foreign_database() {
        let db = WardenDB::open_temporary().unwrap();
        db.bind_vault(&AccountId::from_label("vault/other")).unwrap();
        assert!(matches!(
            AuthorizationLedger::persistent(db, &vault()),
            Err(LedgerError::Storage(_))
        ));
    }

    #[test]
    fn concurrent_consumers_have_one_winner() {
        let ledger = std::sync::Arc::new(AuthorizationLedger::in_memory());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.consume(&id(9), vault()).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(ledger.len(), 1);
    }
}
