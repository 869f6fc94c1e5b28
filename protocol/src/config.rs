//! # Protocol Configuration & Constants
//!
//! Every magic number in Warden lives here. The canonical authorization
//! layout in particular is a wire contract shared with every signer: change
//! it and every outstanding authorization stops verifying, so bump
//! [`AUTHORIZATION_MESSAGE_VERSION`] when you do.

// ---------------------------------------------------------------------------
// Execution Contexts
// ---------------------------------------------------------------------------

/// Mainnet context identifier. `"WARD"` in the high half, network in the low.
pub const CONTEXT_ID_MAINNET: u64 = 0x5741_5244_0000_0001;

/// Testnet context identifier.
pub const CONTEXT_ID_TESTNET: u64 = 0x5741_5244_0000_0002;

/// Devnet context identifier. The default for local runs.
pub const CONTEXT_ID_DEVNET: u64 = 0x5741_5244_0000_0003;

/// Bech32 human-readable prefix for account addresses.
pub const ACCOUNT_HRP: &str = "warden";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 secret key length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Raw Ed25519 signature length.
pub const SIGNATURE_LENGTH: usize = 64;

/// Recoverable authorization signature: `public_key || signature`.
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH;

/// Both BLAKE3 and SHA-256 produce 32-byte digests.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Prefix mixed into every signed payload so an authorization signature can
/// never double as a signature over some other structure. The decimal
/// message length follows it, then the message itself.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Warden Signed Message:\n";

/// Domain-separation context for identities derived from labels rather
/// than keys (vaults, authorities).
pub const ACCOUNT_LABEL_CONTEXT: &str = "warden 2026-01 account label v1";

// ---------------------------------------------------------------------------
// Authorization Message Layout
// ---------------------------------------------------------------------------

/// Version of the canonical authorization layout below.
pub const AUTHORIZATION_MESSAGE_VERSION: u8 = 1;

/// Account identity width (vault and recipient).
pub const ACCOUNT_ID_LENGTH: usize = 32;

/// Nonce width.
pub const NONCE_LENGTH: usize = 32;

/// Amount width (`u64`, big-endian).
pub const AMOUNT_LENGTH: usize = 8;

/// Context identifier width (`u64`, big-endian).
pub const CONTEXT_ID_LENGTH: usize = 8;

/// Total canonical message length:
/// `vault || recipient || amount || nonce || context`.
pub const AUTHORIZATION_MESSAGE_LENGTH: usize =
    ACCOUNT_ID_LENGTH * 2 + AMOUNT_LENGTH + NONCE_LENGTH + CONTEXT_ID_LENGTH;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Decimal places in one display unit.
pub const UNIT_DECIMALS: u32 = 8;

/// Photons per whole unit.
pub const PHOTONS_PER_UNIT: u64 = 100_000_000;

/// Format a photon amount as a decimal unit string, e.g. `50000000` -> `"0.50000000"`.
pub fn format_units(photons: u64) -> String {
    format!(
        "{}.{:0width$}",
        photons / PHOTONS_PER_UNIT,
        photons % PHOTONS_PER_UNIT,
        width = UNIT_DECIMALS as usize
    )
}

/// Parse a decimal unit string (`"1"`, `"0.5"`, `"2.00000001"`) into photons.
///
/// Returns `None` on malformed input, more than [`UNIT_DECIMALS`] fractional
/// digits, or overflow.
pub fn parse_units(s: &str) -> Option<u64> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > UNIT_DECIMALS as usize {
        return None;
    }
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_value: u64 = if frac.is_empty() {
        0
    } else {
        let scale = 10u64.pow(UNIT_DECIMALS - frac.len() as u32);
        frac.parse::<u64>().ok()? * scale
    };

    whole.checked_mul(PHOTONS_PER_UNIT)?.checked_add(frac_value)
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns a friendly name for a context id, mainly for logging.
pub fn context_name(context_id: u64) -> String {
    match context_id {
        CONTEXT_ID_MAINNET => "mainnet".to_string(),
        CONTEXT_ID_TESTNET => "testnet".to_string(),
        CONTEXT_ID_DEVNET => "devnet".to_string(),
        other => format!("custom(0x{:016X})", other),
    }
}
