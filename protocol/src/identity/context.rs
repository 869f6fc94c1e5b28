//! Execution-context identifiers.
//!
//! An authorization binds to exactly one context. The same controller key
//! may sign for devnet and mainnet vaults; the context id in the signed
//! message is what stops a devnet authorization from paying out on mainnet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{context_name, CONTEXT_ID_DEVNET, CONTEXT_ID_MAINNET, CONTEXT_ID_TESTNET};

/// Identifies the deployment environment a vault runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl ContextId {
    pub const MAINNET: ContextId = ContextId(CONTEXT_ID_MAINNET);
    pub const TESTNET: ContextId = ContextId(CONTEXT_ID_TESTNET);
    pub const DEVNET: ContextId = ContextId(CONTEXT_ID_DEVNET);

    /// Fixed-width big-endian encoding used in the canonical message.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn name(self) -> String {
        context_name(self.0)
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::DEVNET
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ContextId {
    type Err = String;

    /// Accepts `mainnet`, `testnet`, `devnet`, a decimal integer, or `0x` hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "mainnet" => return Ok(Self::MAINNET),
            "testnet" => return Ok(Self::TESTNET),
            "devnet" => return Ok(Self::DEVNET),
            _ => {}
        }
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(ContextId)
            .map_err(|_| format!("unrecognized context '{}'", s))
    }
}
