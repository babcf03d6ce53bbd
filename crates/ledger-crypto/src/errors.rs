//! Cryptographic kernel error types.
//!
//! Reference: spec §7 "Error taxonomy" — the primitive-level kinds.

use thiserror::Error;

/// Errors from the cryptographic kernel (C1-C4).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Two buffers that should have matched lengths did not.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// A byte string did not decode to the expected encoding.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A byte string is not a valid secp256k1 point / scalar.
    #[error("invalid point or scalar")]
    InvalidPoint,

    /// Deterministic keypair derivation failed to converge within the
    /// bounded retry budget.
    #[error("user keypair derivation diverged after {0} attempts")]
    DerivationDiverged(u32),

    /// A deposit intent failed to unblind into a valid username.
    #[error("corrupt deposit: {0}")]
    CorruptDeposit(String),

    /// A username failed the validity grammar (spec §4.3).
    #[error("invalid username: {0}")]
    InvalidUsername(String),
}
