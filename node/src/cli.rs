//! # CLI Interface
//!
//! Defines the command-line argument structure for `warden` using `clap`
//! derive. Subcommands: `keygen`, `digest`, `sign`, `demo`, `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use warden_contracts::authorization::Nonce;
use warden_protocol::config::parse_units;
use warden_protocol::identity::{AccountId, ContextId};

/// Warden operator tool.
///
/// Generates controller keys, computes canonical authorization digests,
/// signs withdrawals and runs a scripted end-to-end demo.
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    about = "Warden custodial vault operator tool",
    version,
    propagate_version = true
)]
pub struct WardenCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "WARDEN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new controller keypair.
    Keygen,
    /// Print the canonical message and authorization id for a withdrawal.
    Digest(AuthorizationArgs),
    /// Sign a withdrawal authorization with the controller key.
    Sign(SignArgs),
    /// Deploy a vault on an in-memory host and run the reference scenario.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// The tuple a controller authorizes.
#[derive(Args, Debug, Clone)]
pub struct AuthorizationArgs {
    /// Vault identity (`warden1...` address or hex).
    #[arg(long)]
    pub vault: AccountId,

    /// Recipient identity (`warden1...` address or hex).
    #[arg(long)]
    pub recipient: AccountId,

    /// Amount in units, up to 8 decimals (e.g. `0.5`).
    #[arg(long, value_parser = parse_amount)]
    pub amount: u64,

    /// 64 hex characters, or any other string to be hashed into a nonce.
    #[arg(long, value_parser = parse_nonce)]
    pub nonce: Nonce,

    /// Execution context: `mainnet`, `testnet`, `devnet` or an integer.
    #[arg(long, env = "WARDEN_CONTEXT", default_value = "devnet")]
    pub context: ContextId,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub authorization: AuthorizationArgs,

    /// Hex-encoded Ed25519 controller secret key.
    ///
    /// **Prefer the environment variable**; command lines end up in shell
    /// history.
    #[arg(long, env = "WARDEN_CONTROLLER_KEY", hide_env_values = true)]
    pub controller_key: String,
}

/// Arguments for the `demo` subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Execution context of the simulated host.
    #[arg(long, env = "WARDEN_CONTEXT", default_value = "devnet")]
    pub context: ContextId,

    /// Controller secret key (hex). A fresh key is generated when omitted.
    #[arg(long, env = "WARDEN_CONTROLLER_KEY", hide_env_values = true)]
    pub controller_key: Option<String>,

    /// Keep the replay ledger in a sled database under this directory.
    #[arg(long, short = 'd', env = "WARDEN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Label the vault identity is derived from.
    #[arg(long, default_value = "treasury")]
    pub vault_label: String,

    /// Print the Prometheus text exposition after the run.
    #[arg(long)]
    pub metrics: bool,
}

fn parse_amount(s: &str) -> Result<u64, String> {
    parse_units(s).ok_or_else(|| format!("invalid amount '{}'", s))
}

fn parse_nonce(s: &str) -> Result<Nonce, String> {
    let hex_digits = s.strip_prefix("0x").unwrap_or(s);
    if hex_digits.len() == 64 {
        if let Ok(nonce) = Nonce::from_hex(hex_digits) {
            return Ok(nonce);
        }
    }
    Ok(Nonce::from_label(s))
}
