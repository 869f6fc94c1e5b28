//! # Storage Module
//!
//! Durable state for the one thing a vault must never forget: which
//! authorizations it has already honoured.
//!
//! ```text
//! db.rs    WardenDB, sled trees for consumed authorizations and metadata
//! ```
//!
//! Values are bincode. Keys are raw 32-byte authorization digests.

pub mod db;

pub use db::{ConsumptionRecord, DbError, DbResult, WardenDB};
