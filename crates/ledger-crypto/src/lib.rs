//! # Ledger Crypto — Cryptographic Kernel
//!
//! Implements the four leaf components of the system (spec §2 C1-C4):
//!
//! | Module | Spec section | Responsibility |
//! |--------|--------------|-----------------|
//! | `bytes` | §4.1 | Fixed-width codecs, XOR, namespaced KDF/HMAC |
//! | `keys` | §4.2 | secp256k1 keypairs, ECDH, deterministic user derivation |
//! | `deposit` | §4.3 | Username validity, deposit blinding/unblinding |
//! | `leaf_cipher` | §4.4 | Per-slot 4-byte balance encryption |
//!
//! ## Security Properties
//!
//! - **Even-y convention**: public keys are serialized as 32-byte x-only
//!   values; private keys whose point has odd y are rejected and redrawn.
//! - **Namespaced keying**: every HMAC/KDF call is bound to one of the
//!   namespaces in `ledger_types::namespaces`, preventing key reuse across
//!   unrelated derivations.
//! - **Nonce-keyed balances**: every balance re-encryption increments the
//!   leaf nonce, so no two ciphertexts under the same shared secret ever
//!   reuse key material.

#![warn(missing_docs)]

pub mod bytes;
pub mod deposit;
pub mod errors;
pub mod keys;
pub mod leaf_cipher;

pub use errors::CryptoError;
pub use keys::{Keypair, SharedSecretBytes};
