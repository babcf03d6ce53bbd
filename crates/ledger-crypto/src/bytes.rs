//! # Byte Primitives (C1)
//!
//! Fixed-width integer codecs, XOR, and namespaced key derivation.
//!
//! Reference: spec §4.1.
//!
//! ## HMAC primitive choice
//!
//! The spec leaves the namespaced HMAC construction as an implementer
//! choice, requiring only that the TEE and any verifier agree. This
//! implementation pins it to **HMAC-SHA-256**: `hmac_ns(key, ns, data) =
//! HMAC-SHA-256(key, ns ∥ data)`. The static deposit KDF is kept separate
//! (keccak-256) per spec, since the deposit masker has no nonce to key on.

use crate::errors::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

type HmacSha256 = Hmac<Sha256>;

/// Decode 4 big-endian bytes into a `u32`.
pub fn decode_u32(bytes: &[u8]) -> Result<u32, CryptoError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| CryptoError::LengthMismatch {
        expected: 4,
        actual: bytes.len(),
    })?;
    Ok(u32::from_be_bytes(arr))
}

/// Encode a `u32` as 4 big-endian bytes.
#[must_use]
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Byte-wise XOR of two equal-length buffers.
pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if a.len() != b.len() {
        return Err(CryptoError::LengthMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect())
}

/// XOR of two equal-length fixed arrays.
#[must_use]
pub fn xor_fixed<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    for i in 0..N {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Namespaced static KDF: `H(namespace || secret)` with keccak-256.
///
/// Used exclusively for the nonce-less deposit blinding mask (§4.3).
#[must_use]
pub fn kdf(secret: &[u8], namespace: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(namespace);
    hasher.update(secret);
    hasher.finalize().into()
}

/// Namespaced HMAC: `HMAC-SHA-256(key, namespace || data)`.
///
/// Every per-balance and per-leaf-choice derivation in the manager goes
/// through this function with a distinct namespace (spec §6 table).
#[must_use]
pub fn hmac_ns(key: &[u8], namespace: &[u8], data: &[u8]) -> [u8; 32] {
    // HMAC accepts keys of any length by spec.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(namespace);
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// keccak-256 of a single input buffer.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
