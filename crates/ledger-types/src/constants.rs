//! Domain constants.
//!
//! Reference: spec §6 "Domain constants".

/// Internal-to-token decimal scaling factor (6-decimal token → 2-decimal internal).
pub const D: u64 = 10_000;

/// Maximum representable internal balance (u32::MAX hundredths of a token).
pub const MAX_BALANCE: u32 = u32::MAX;

/// Number of per-user slots packed into one leaf.
pub const LEAF_CAPACITY: u32 = 6;

/// Default chaff-to-real leaf count ratio.
pub const CHAFF_MULTIPLIER: usize = 3;

/// Length in bytes of an x-only secp256k1 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length in bytes of a secp256k1 private scalar.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Width in bytes of one encrypted balance slot.
pub const BALANCE_BYTES: usize = 4;

/// Global user index 0 is never assigned; it signals "user not registered".
pub const SENTINEL_USER_INDEX: u32 = 0;

/// Bounded retry count for deterministic user-keypair derivation (§4.2).
pub const USER_KEYPAIR_MAX_RETRIES: u32 = 256;

/// Multiplier applied to the chaff target to bound chaff-selection iterations (§4.6.4).
pub const CHAFF_SATURATION_FACTOR: u64 = 10;
