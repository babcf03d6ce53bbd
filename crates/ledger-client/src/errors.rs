//! Client-side errors.

use ledger_crypto::CryptoError;
use thiserror::Error;

/// Errors from the user client's operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client's public key has no global index assigned yet.
    #[error("user is not registered")]
    NotRegistered,

    /// The ledger gateway failed to answer a read.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// A cryptographic primitive failed (ECDH, decryption).
    #[error("crypto primitive failed: {0}")]
    Crypto(#[from] CryptoError),

    /// The ledger reported a registered user with no backing leaf, or
    /// another invariant violation the client cannot recover from.
    #[error("inconsistent ledger state: {0}")]
    InconsistentState(String),
}
