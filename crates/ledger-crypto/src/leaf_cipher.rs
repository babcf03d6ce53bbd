//! # Leaf Cipher (C4)
//!
//! Per-position 4-byte balance encryption keyed by `(shared secret, leaf
//! nonce)`.
//!
//! Reference: spec §4.4.

use crate::bytes::{decode_u32, encode_u32, hmac_ns, xor_fixed};
use crate::errors::CryptoError;
use ledger_types::NS_BALANCE;

/// Derive the 4-byte balance key for a given shared secret and leaf nonce.
///
/// Reference: spec §4.4 "Balance key".
fn balance_key(shared_secret: &[u8], leaf_nonce: u32) -> [u8; 4] {
    let digest = hmac_ns(shared_secret, NS_BALANCE, &encode_u32(leaf_nonce));
    let mut key = [0u8; 4];
    key.copy_from_slice(&digest[..4]);
    key
}

/// Encrypt a balance under the given shared secret and leaf nonce.
///
/// Reference: spec §4.4 "Encrypt".
#[must_use]
pub fn encrypt_balance(balance: u32, shared_secret: &[u8], leaf_nonce: u32) -> [u8; 4] {
    let key = balance_key(shared_secret, leaf_nonce);
    xor_fixed(&encode_u32(balance), &key)
}

/// Decrypt a balance under the given shared secret and leaf nonce.
///
/// Reference: spec §4.4 "Decrypt".
pub fn decrypt_balance(
    ciphertext: &[u8; 4],
    shared_secret: &[u8],
    leaf_nonce: u32,
) -> Result<u32, CryptoError> {
    let key = balance_key(shared_secret, leaf_nonce);
    let plaintext = xor_fixed(ciphertext, &key);
    decode_u32(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_for_boundary_balances() {
        let shared_secret = [0x5Au8; 33];
        for balance in [0u32, 1, 10_000, u32::MAX] {
            for nonce in [0u32, 1, 42] {
                let ciphertext = encrypt_balance(balance, &shared_secret, nonce);
                let recovered = decrypt_balance(&ciphertext, &shared_secret, nonce).unwrap();
                assert_eq!(recovered, balance);
            }
        }
    }

    #[test]
    fn differing_nonces_change_ciphertext() {
        let shared_secret = [0x5Au8; 33];
        let c0 = encrypt_balance(10_000, &shared_secret, 0);
        let c1 = encrypt_balance(10_000, &shared_secret, 1);
        assert_ne!(c0, c1);
    }

    #[test]
    fn differing_secrets_change_ciphertext() {
        let c0 = encrypt_balance(10_000, &[0x01u8; 33], 0);
        let c1 = encrypt_balance(10_000, &[0x02u8; 33], 0);
        assert_ne!(c0, c1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_holds_for_any_balance_secret_nonce(
            balance in any::<u32>(),
            secret in proptest::collection::vec(any::<u8>(), 1..64),
            nonce in any::<u32>(),
        ) {
            let ciphertext = encrypt_balance(balance, &secret, nonce);
            let recovered = decrypt_balance(&ciphertext, &secret, nonce).unwrap();
            prop_assert_eq!(recovered, balance);
        }
    }
}
