//! # Demo Scenario
//!
//! Deploys an authority and a vault on an in-memory host, funds the vault
//! with 1.0 unit through an ordinary transfer, then plays the reference
//! sequence:
//!
//! 1. withdraw 0.5 with nonce N1, signed by the controller  -> executed
//! 2. replay the same request                               -> already used
//! 3. withdraw 2.0 with nonce N2                            -> insufficient
//! 4. withdraw 0.1 signed by someone else                   -> invalid signature
//!
//! Nonces are random so that a persistent ledger (`--data-dir`) can be
//! reused across runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use warden_contracts::authorization::{sign_authorization, Nonce};
use warden_contracts::deployment::{deploy_with_ledger, vault_identity};
use warden_contracts::ledger::AuthorizationLedger;
use warden_contracts::vault::{VaultCore, WithdrawalReceipt};
use warden_protocol::config::{format_units, PHOTONS_PER_UNIT};
use warden_protocol::crypto::WardenKeypair;
use warden_protocol::host::{HostLedger, InMemoryLedger};
use warden_protocol::identity::{AccountId, ContextId};

use crate::metrics::VaultMetrics;

/// Inputs to a demo run.
pub struct DemoConfig {
    pub context: ContextId,
    pub controller: WardenKeypair,
    pub data_dir: Option<PathBuf>,
    pub vault_label: String,
}

/// Outcome of one withdrawal attempt.
#[derive(Debug, Serialize)]
pub struct DemoStep {
    pub step: &'static str,
    pub accepted: bool,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<WithdrawalReceipt>,
}

/// Everything a demo run did.
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub context: String,
    pub controller: AccountId,
    pub vault: AccountId,
    pub recipient: AccountId,
    pub steps: Vec<DemoStep>,
    pub vault_balance: String,
    pub recipient_balance: String,
    pub consumed_authorizations: usize,
}

/// Run the scenario.
pub fn run(config: &DemoConfig, metrics: &VaultMetrics) -> Result<DemoReport> {
    let host = Arc::new(InMemoryLedger::new(config.context));
    let controller = AccountId::from_public_key(&config.controller.public_key());

    let ledger = match &config.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
            let path = dir.join("ledger");
            let ledger = AuthorizationLedger::open(&path, &vault_identity(&config.vault_label))
                .with_context(|| format!("failed to open ledger at {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                consumed = ledger.len(),
                "persistent replay ledger opened"
            );
            ledger
        }
        None => AuthorizationLedger::in_memory(),
    };

    let deployment = deploy_with_ledger(host.clone(), controller, &config.vault_label, ledger)
        .context("deployment failed")?;
    let vault = deployment.vault;

    // Deposit: an ordinary host transfer into the vault identity.
    let depositor = AccountId::from_label("demo/depositor");
    host.mint(&depositor, 10 * PHOTONS_PER_UNIT)
        .context("failed to fund depositor")?;
    host.transfer(&depositor, &vault.identity(), PHOTONS_PER_UNIT)
        .context("deposit into vault failed")?;
    tracing::info!(balance = %format_units(vault.balance()), "vault funded");

    let recipient = AccountId::from_label("demo/recipient");
    let attacker = WardenKeypair::generate();
    let n1 = Nonce::random();
    let n2 = Nonce::random();
    let n3 = Nonce::random();

    let step = |name, signer: &WardenKeypair, amount, nonce| {
        attempt(&vault, metrics, name, signer, recipient, amount, nonce)
    };
    let steps = vec![
        step("withdraw 0.5 (N1)", &config.controller, PHOTONS_PER_UNIT / 2, n1),
        step("replay N1", &config.controller, PHOTONS_PER_UNIT / 2, n1),
        step("withdraw 2.0 (N2)", &config.controller, 2 * PHOTONS_PER_UNIT, n2),
        step("forged 0.1 (N3)", &attacker, PHOTONS_PER_UNIT / 10, n3),
    ];

    Ok(DemoReport {
        context: config.context.to_string(),
        controller,
        vault: vault.identity(),
        recipient,
        steps,
        vault_balance: format_units(vault.balance()),
        recipient_balance: format_units(host.balance_of(&recipient)),
        consumed_authorizations: vault.ledger().len(),
    })
}

fn attempt(
    vault: &VaultCore,
    metrics: &VaultMetrics,
    step: &'static str,
    signer: &WardenKeypair,
    recipient: AccountId,
    amount: u64,
    nonce: Nonce,
) -> DemoStep {
    let message = vault.authorization_message(recipient, amount, nonce);
    let signature = sign_authorization(signer, &message).to_bytes();

    let started = Instant::now();
    let outcome = vault.withdraw(recipient, amount, nonce, &signature);
    metrics.observe(&outcome, started.elapsed(), vault.balance());

    match outcome {
        Ok(receipt) => DemoStep {
            step,
            accepted: true,
            outcome: "executed".to_string(),
            receipt: Some(receipt),
        },
        Err(e) => DemoStep {
            step,
            accepted: false,
            outcome: e.to_string(),
            receipt: None,
        },
    }
}
