//! # Ledger Client — Read-Only User Client (C7)
//!
//! A user knows their username-derived keypair (bootstrapped out-of-band
//! from the enclave's deterministic per-user derivation, §4.2) and the
//! TEE's public key. This crate gives them `get_balance()` and
//! `watch_balance()` against the same [`ledger_manager::LedgerGateway`]
//! port the manager uses, and the same ciphertext layout `ledger-crypto`
//! produces.
//!
//! Reference: spec §4.7.

#![warn(missing_docs)]

pub mod balance;
pub mod errors;

pub use balance::{BalanceUpdate, BalanceWatch, UserClient};
pub use errors::ClientError;
