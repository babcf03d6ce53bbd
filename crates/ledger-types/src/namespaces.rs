//! Namespace string table (exact ASCII bytes).
//!
//! Reference: spec §6 "Namespace string table". Changing these bytes changes
//! every derived key and transcript; they are therefore pinned as `&'static
//! [u8]` constants rather than configuration.

/// Deposit blinding mask namespace.
pub const NS_DEPOSIT: &[u8] = b"LitGhost.deposit";

/// Per-balance encryption key namespace.
pub const NS_BALANCE: &[u8] = b"LitGhost.balance";

/// User keypair derivation namespace.
pub const NS_USER: &[u8] = b"LitGhost.user";

/// Chaff set seed namespace.
pub const NS_CHAFF: &[u8] = b"LitGhost.chaff";

/// Leaf order shuffle namespace.
pub const NS_LEAF_ORDER: &[u8] = b"LitGhost.leaf.order";
