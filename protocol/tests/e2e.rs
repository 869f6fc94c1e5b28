//! End-to-end integration tests for the Warden primitives.
//!
//! These compose keys, identities, recoverable signatures, the in-memory
//! host and sled storage the way the vault layer does, without the vault.

use std::sync::Arc;
use std::thread;

use warden_protocol::config::{format_units, parse_units, PHOTONS_PER_UNIT};
use warden_protocol::crypto::{recover_signer, sign_message, WardenKeypair};
use warden_protocol::host::{HostLedger, InMemoryLedger, TransferError};
use warden_protocol::identity::{AccountId, ContextId};
use warden_protocol::storage::{ConsumptionRecord, WardenDB};

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

#[test]
fn signer_identity_survives_address_roundtrip() {
    let kp = WardenKeypair::generate();
    let address = AccountId::from_public_key(&kp.public_key()).to_address();

    let sig = sign_message(&kp, b"authorization digest");
    let recovered = recover_signer(b"authorization digest", &sig.to_bytes()).unwrap();

    assert_eq!(recovered.to_address(), address);
    assert_eq!(address.parse::<AccountId>().unwrap(), recovered);
}

#[test]
fn signature_from_hex_recovers_same_signer() {
    let kp = WardenKeypair::from_seed(&[3u8; 32]);
    let hex_sig = sign_message(&kp, b"m").to_hex();
    let bytes = hex::decode(hex_sig).unwrap();
    assert_eq!(
        recover_signer(b"m", &bytes).unwrap(),
        AccountId::from_public_key(&kp.public_key())
    );
}

// ---------------------------------------------------------------------------
// Host ledger
// ---------------------------------------------------------------------------

#[test]
fn concurrent_transfers_conserve_supply() {
    let host = Arc::new(InMemoryLedger::new(ContextId::TESTNET));
    let treasury = AccountId::from_label("treasury");
    host.mint(&treasury, 100 * PHOTONS_PER_UNIT).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let host = host.clone();
            thread::spawn(move || {
                let to = AccountId::from_label(&format!("worker-{}", i));
                for _ in 0..10 {
                    host.transfer(&treasury, &to, PHOTONS_PER_UNIT).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(host.balance_of(&treasury), 20 * PHOTONS_PER_UNIT);
    assert_eq!(host.total_supply(), 100 * PHOTONS_PER_UNIT as u128);
    assert_eq!(host.account_count(), 9);
}

#[test]
fn failed_transfer_leaves_balances_untouched() {
    let host = InMemoryLedger::new(ContextId::DEVNET);
    let a = AccountId::from_label("a");
    let b = AccountId::from_label("b");
    host.mint(&a, parse_units("1.5").unwrap()).unwrap();

    let err = host.transfer(&a, &b, parse_units("2").unwrap()).unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds { .. }));
    assert_eq!(format_units(host.balance_of(&a)), "1.50000000");
    assert_eq!(host.balance_of(&b), 0);
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[test]
fn racing_inserts_on_sled_have_one_winner() {
    let db = WardenDB::open_temporary().unwrap();
    let vault = AccountId::from_label("vault/race");
    let digest = [0xEE; 32];

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                db.insert_consumed(&digest, &ConsumptionRecord::now(vault))
                    .unwrap()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(db.consumed_count(), 1);
}
