// Copyright (c) 2026 Warden Contributors. MIT License.
// See LICENSE for details.

//! # Warden Operator CLI
//!
//! Entry point for the `warden` binary. Parses CLI arguments, initializes
//! logging, and dispatches:
//!
//! - `keygen`: generate a controller keypair
//! - `digest`: canonical message and authorization id for a withdrawal
//! - `sign`: controller-side signature over an authorization
//! - `demo`: deploy a vault in memory and run the reference scenario
//! - `version`: print build version information

mod cli;
mod demo;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;

use warden_contracts::authorization::{sign_authorization, AuthorizationMessage};
use warden_protocol::config::{format_units, AUTHORIZATION_MESSAGE_VERSION};
use warden_protocol::crypto::WardenKeypair;
use warden_protocol::identity::AccountId;

use cli::{AuthorizationArgs, Commands, WardenCli};
use logging::LogFormat;
use metrics::VaultMetrics;

fn main() -> Result<()> {
    let cli = WardenCli::parse();
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Digest(args) => digest(&args),
        Commands::Sign(args) => sign(args),
        Commands::Demo(args) => run_demo(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Generates a controller keypair and prints it as JSON.
fn keygen() -> Result<()> {
    let keypair = WardenKeypair::generate();
    let public_key = keypair.public_key();
    let account = AccountId::from_public_key(&public_key);

    tracing::info!(%account, "controller keypair generated");

    let out = serde_json::json!({
        "secret_key": hex::encode(keypair.secret_key_bytes()),
        "public_key": public_key.to_hex(),
        "public_key_base58": public_key.to_base58(),
        "account": account.to_address(),
        "account_hex": account.to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn message_from(args: &AuthorizationArgs) -> AuthorizationMessage {
    AuthorizationMessage {
        vault: args.vault,
        recipient: args.recipient,
        amount: args.amount,
        nonce: args.nonce,
        context: args.context,
    }
}

/// Prints the canonical message and its authorization id.
fn digest(args: &AuthorizationArgs) -> Result<()> {
    let message = message_from(args);
    let out = serde_json::json!({
        "version": AUTHORIZATION_MESSAGE_VERSION,
        "vault": message.vault.to_address(),
        "recipient": message.recipient.to_address(),
        "amount": format_units(message.amount),
        "amount_photons": message.amount,
        "nonce": message.nonce.to_hex(),
        "context": message.context.to_string(),
        "message": hex::encode(message.encode()),
        "authorization_id": message.digest().to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Signs an authorization with the controller key.
fn sign(args: cli::SignArgs) -> Result<()> {
    let keypair =
        WardenKeypair::from_hex(&args.controller_key).context("invalid controller key")?;
    let message = message_from(&args.authorization);
    let signature = sign_authorization(&keypair, &message);

    tracing::info!(
        signer = %AccountId::from_public_key(&keypair.public_key()),
        authorization_id = %message.digest(),
        "authorization signed"
    );

    let out = serde_json::json!({
        "authorization_id": message.digest().to_hex(),
        "signer": AccountId::from_public_key(&keypair.public_key()).to_address(),
        "signature": signature.to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Runs the scripted scenario and prints the report.
fn run_demo(args: cli::DemoArgs) -> Result<()> {
    let controller = match &args.controller_key {
        Some(key) => WardenKeypair::from_hex(key).context("invalid controller key")?,
        None => WardenKeypair::generate(),
    };

    tracing::info!(
        context = %args.context,
        vault_label = %args.vault_label,
        persistent = args.data_dir.is_some(),
        "starting demo"
    );

    let metrics = VaultMetrics::new();
    let report = demo::run(
        &demo::DemoConfig {
            context: args.context,
            controller,
            data_dir: args.data_dir,
            vault_label: args.vault_label,
        },
        &metrics,
    )?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.metrics {
        let text = metrics.encode().context("failed to encode metrics")?;
        println!("{}", text);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("warden    {}", env!("CARGO_PKG_VERSION"));
    println!("message   v{}", AUTHORIZATION_MESSAGE_VERSION);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
