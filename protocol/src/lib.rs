// Copyright (c) 2026 Warden Contributors. MIT License.
// See LICENSE for details.

//! # Warden Protocol: Core Primitives
//!
//! Warden is a custodial vault that releases funds only against a signed,
//! single-use authorization from one designated controller. This crate holds
//! the primitives the vault is built from; the vault itself lives in
//! `warden-contracts`.
//!
//! ## Architecture
//!
//! - **config**: Wire constants, context identifiers, unit formatting.
//! - **crypto**: Hashing, Ed25519 keys, recoverable authorization signatures.
//! - **identity**: Account identities and execution-context identifiers.
//! - **host**: The host-ledger seam: balances and native transfers.
//! - **storage**: sled-backed persistence for consumed authorizations.
//!
//! ## Ground rules
//!
//! 1. Amounts are `u64` photons. No floating point anywhere near money.
//! 2. Malformed input fails with an error or `false`, never a panic.
//! 3. Key material is never logged.

pub mod config;
pub mod crypto;
pub mod host;
pub mod identity;
pub mod storage;
