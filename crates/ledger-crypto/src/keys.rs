//! # Key Agreement (C2)
//!
//! secp256k1 keypairs under the even-y convention, ECDH shared secrets, and
//! deterministic per-user keypair derivation.
//!
//! Reference: spec §4.2.
//!
//! ## Even-y convention
//!
//! A private key is only valid if its public point has an even y-coordinate
//! (SEC1 prefix `0x02`). This lets every public key be carried on the wire
//! as just its 32-byte x-coordinate (`ledger_types::PublicKey`); the prefix
//! is always re-derived as `0x02` on reconstruction.

use crate::errors::CryptoError;
use k256::elliptic_curve::group::Curve;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{EncodedPoint, ProjectivePoint, PublicKey as K256PublicKey, SecretKey};
use ledger_types::{PrivateKey, PublicKey, USER_KEYPAIR_MAX_RETRIES};

use crate::bytes::hmac_ns;
use ledger_types::NS_USER;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The 33-byte compressed-point serialization of an ECDH shared secret.
pub type SharedSecretBytes = [u8; 33];

/// A secp256k1 keypair: a 32-byte private scalar and its 32-byte x-only
/// public key (even-y convention). The private scalar is zeroized on drop.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Keypair {
    private: PrivateKey,
    #[zeroize(skip)]
    public: PublicKey,
}

impl Keypair {
    /// The private scalar.
    #[must_use]
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// The x-only public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

/// Compute the x-only public key and even-y flag for a secret key.
fn public_key_parts(secret: &SecretKey) -> (PublicKey, bool) {
    let encoded = secret.public_key().to_encoded_point(true);
    let raw = encoded.as_bytes();
    let mut x = [0u8; 32];
    x.copy_from_slice(&raw[1..33]);
    (x, raw[0] == 0x02)
}

/// Reconstruct a full compressed secp256k1 public key from its x-only form,
/// assuming the fixed even-y prefix `0x02`.
///
/// Reference: spec §4.2 "Reconstruct compressed public key".
pub fn reconstruct_public_key(x: &PublicKey) -> Result<K256PublicKey, CryptoError> {
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(x);
    let point = EncodedPoint::from_bytes(compressed).map_err(|_| CryptoError::InvalidPoint)?;
    K256PublicKey::from_encoded_point(&point)
        .into_option()
        .ok_or(CryptoError::InvalidPoint)
}

/// Draw a random secp256k1 keypair, redrawing until the public point has
/// even y-parity.
///
/// Reference: spec §4.2 "Random keypair".
#[must_use]
pub fn generate_keypair() -> Keypair {
    loop {
        let secret = SecretKey::random(&mut rand::thread_rng());
        let (x, even) = public_key_parts(&secret);
        if even {
            let private: [u8; 32] = secret.to_bytes().into();
            return Keypair { private, public: x };
        }
    }
}

/// Compute the ECDH shared secret between a local private key and a peer's
/// x-only public key.
///
/// The shared secret is the *full compressed serialization* of the
/// scalar-multiplied point (33 bytes), per spec §4.2 — not just its
/// x-coordinate, unlike `k256::ecdh::diffie_hellman`.
pub fn ecdh_shared_secret(
    private: &PrivateKey,
    peer_public_x: &PublicKey,
) -> Result<SharedSecretBytes, CryptoError> {
    let bytes: [u8; 32] = *private;
    let secret = SecretKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPoint)?;
    let peer_public = reconstruct_public_key(peer_public_x)?;

    let shared_point =
        ProjectivePoint::from(*peer_public.as_affine()) * *secret.to_nonzero_scalar();
    let affine = shared_point.to_affine();
    let encoded = affine.to_encoded_point(true);

    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// Deterministically derive a user's keypair from their username and the
/// TEE's user-master key.
///
/// Reference: spec §4.2 "Deterministic user keypair".
pub fn derive_user_keypair(master_key: &[u8; 32], username: &str) -> Result<Keypair, CryptoError> {
    let mut seed = hmac_ns(master_key, NS_USER, username.as_bytes());

    for _ in 0..USER_KEYPAIR_MAX_RETRIES {
        if let Ok(secret) = SecretKey::from_bytes((&seed).into()) {
            let (x, even) = public_key_parts(&secret);
            if even {
                return Ok(Keypair { private: seed, public: x });
            }
        }
        seed = hmac_ns(master_key, NS_USER, &seed);
    }

    Err(CryptoError::DerivationDiverged(USER_KEYPAIR_MAX_RETRIES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypair_has_even_y_public_key() {
        let keypair = generate_keypair();
        let reconstructed = reconstruct_public_key(keypair.public_key()).unwrap();
        let encoded = reconstructed.to_encoded_point(true);
        assert_eq!(encoded.as_bytes()[0], 0x02);
    }

    #[test]
    fn ecdh_is_symmetric() {
        let alice = generate_keypair();
        let bob = generate_keypair();

        let alice_side = ecdh_shared_secret(alice.private_key(), bob.public_key()).unwrap();
        let bob_side = ecdh_shared_secret(bob.private_key(), alice.public_key()).unwrap();

        assert_eq!(alice_side, bob_side);
    }

    #[test]
    fn derive_user_keypair_is_deterministic() {
        let master_key = [0x42u8; 32];
        let a = derive_user_keypair(&master_key, "alice").unwrap();
        let b = derive_user_keypair(&master_key, "alice").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn derive_user_keypair_differs_per_username() {
        let master_key = [0x42u8; 32];
        let alice = derive_user_keypair(&master_key, "alice").unwrap();
        let bob = derive_user_keypair(&master_key, "bob").unwrap();
        assert_ne!(alice.public_key(), bob.public_key());
    }

    #[test]
    fn derived_public_key_always_even_y() {
        let master_key = [0x99u8; 32];
        for name in ["a", "quantum", "zz", "user_123"] {
            let keypair = derive_user_keypair(&master_key, name).unwrap();
            let reconstructed = reconstruct_public_key(keypair.public_key()).unwrap();
            assert_eq!(reconstructed.to_encoded_point(true).as_bytes()[0], 0x02);
        }
    }

    #[test]
    fn reconstruct_public_key_round_trips_generated_key() {
        let keypair = generate_keypair();
        let reconstructed = reconstruct_public_key(keypair.public_key()).unwrap();
        let x = &reconstructed.to_encoded_point(true).as_bytes()[1..33];
        assert_eq!(x, keypair.public_key());
    }
}
