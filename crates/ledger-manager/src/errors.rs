//! Manager-level errors.
//!
//! Per spec §7's propagation policy: these are the failures that abort an
//! invocation outright (no partial progress ever reaches the ledger).
//! Per-operation failures never reach this type — they are converted to
//! [`ledger_types::SkippedOp`] records instead.

use ledger_crypto::CryptoError;
use ledger_transcript::TranscriptError;
use thiserror::Error;

/// Errors that abort a manager invocation.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The ledger gateway failed to answer a read.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// A cryptographic primitive failed outside a per-operation scope
    /// (e.g. re-encrypting an already-validated leaf).
    #[error("crypto primitive failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Transcript construction failed (caller contract violation, not a
    /// cryptographic failure).
    #[error("transcript construction failed: {0}")]
    Transcript(#[from] TranscriptError),

    /// The ledger returned a leaf/user-count pairing inconsistent with its
    /// own invariants (e.g. a leaf index out of range of `userCount`).
    #[error("inconsistent ledger state: {0}")]
    InconsistentState(String),
}
