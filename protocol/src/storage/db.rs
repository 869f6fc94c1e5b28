//! # WardenDB: Persistent Replay Ledger Storage
//!
//! sled-backed storage for consumed authorization digests.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                      | Value                        |
//! |------------|--------------------------|------------------------------|
//! | `consumed` | digest (32B)             | `bincode(ConsumptionRecord)` |
//! | `metadata` | key (UTF-8)              | value (bytes)                |
//!
//! ## Atomicity
//!
//! Consumption is a single `compare_and_swap(digest, None, Some(record))`.
//! sled linearizes it, so two writers racing on the same digest cannot both
//! observe "absent" and both succeed. There is no delete path: the
//! `consumed` tree is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;

use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The database was created for a different vault.
    #[error("database is bound to vault {bound}, not {requested}")]
    VaultMismatch {
        bound: AccountId,
        requested: AccountId,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Metadata key recording which vault owns this database.
const META_VAULT_IDENTITY: &[u8] = b"vault_identity";

// ---------------------------------------------------------------------------
// ConsumptionRecord
// ---------------------------------------------------------------------------

/// What the ledger remembers about a consumed authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// The vault that consumed it.
    pub vault: AccountId,
    /// When it was consumed.
    pub consumed_at: DateTime<Utc>,
}

impl ConsumptionRecord {
    pub fn now(vault: AccountId) -> Self {
        Self {
            vault,
            consumed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// WardenDB
// ---------------------------------------------------------------------------

/// Persistent storage engine for replay protection.
///
/// sled is thread-safe; share a `WardenDB` across threads by cloning it
/// (clones share the same underlying database).
#[derive(Clone)]
pub struct WardenDB {
    db: Db,
    consumed: Tree,
    metadata: Tree,
}

impl WardenDB {
    /// Open or create a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway database, removed when dropped. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let consumed = db.open_tree("consumed")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            consumed,
            metadata,
        })
    }

    /// Bind this database to `vault`, or confirm an existing binding.
    ///
    /// A replay ledger only means something for the vault that wrote it.
    pub fn bind_vault(&self, vault: &AccountId) -> DbResult<()> {
        let swap = self.metadata.compare_and_swap(
            META_VAULT_IDENTITY,
            None as Option<&[u8]>,
            Some(vault.as_bytes().as_slice()),
        )?;
        match swap {
            Ok(()) => {
                self.db.flush()?;
                Ok(())
            }
            Err(existing) => {
                let bound: [u8; 32] = existing
                    .current
                    .as_deref()
                    .unwrap_or_default()
                    .try_into()
                    .map_err(|_| DbError::Serialization("corrupt vault binding".into()))?;
                let bound = AccountId::from_bytes(bound);
                if &bound == vault {
                    Ok(())
                } else {
                    Err(DbError::VaultMismatch {
                        bound,
                        requested: *vault,
                    })
                }
            }
        }
    }

    /// The vault this database is bound to, if any.
    pub fn bound_vault(&self) -> DbResult<Option<AccountId>> {
        match self.metadata.get(META_VAULT_IDENTITY)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes[..]
                    .try_into()
                    .map_err(|_| DbError::Serialization("corrupt vault binding".into()))?;
                Ok(Some(AccountId::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // -- Consumed authorizations ----------------------------------------------

    /// Record `digest` as consumed unless it already is.
    ///
    /// Returns `true` if this call inserted it, `false` if it was already
    /// present. The write is flushed before returning `true`.
    pub fn insert_consumed(
        &self,
        digest: &[u8; 32],
        record: &ConsumptionRecord,
    ) -> DbResult<bool> {
        let value =
            bincode::serialize(record).map_err(|e| DbError::Serialization(e.to_string()))?;
        let swap = self
            .consumed
            .compare_and_swap(digest, None as Option<&[u8]>, Some(value))?;
        if swap.is_err() {
            return Ok(false);
        }
        self.consumed.flush()?;
        Ok(true)
    }

    pub fn contains_consumed(&self, digest: &[u8; 32]) -> DbResult<bool> {
        Ok(self.consumed.contains_key(digest)?)
    }

    pub fn get_consumed(&self, digest: &[u8; 32]) -> DbResult<Option<ConsumptionRecord>> {
        match self.consumed.get(digest)? {
            Some(bytes) => {
                let record = bincode::deserialize(&bytes)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for WardenDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenDB")
            .field("consumed", &self.consumed.len())
            .finish()
    }
}
