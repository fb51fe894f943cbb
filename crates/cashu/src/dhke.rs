//! Blind Diffie-Hellman Key Exchange
//!
//! <https://github.com/cashubtc/nuts/blob/main/00.md>
//!
//! The wallet side of the BDHKE used by Cashu's blind signature scheme:
//! `hash_to_curve`, `blind_message` (step 1), `unblind_message` (step 3),
//! and `construct_proofs`, which assembles the final spendable [`Proof`]s
//! once the mint's blind signatures come back. Signing (step 2) and
//! signature verification are a mint's job and out of scope here.

use bitcoin::secp256k1::{self, PublicKey as Secp256k1PublicKey};
use thiserror::Error;

use crate::nuts::nut00::{BlindSignature, Proof, Proofs};
use crate::nuts::nut01::{Keys, PublicKey, SecretKey};
use crate::secret::Secret;
use crate::SECP256K1;

const DOMAIN_SEPARATOR: &[u8; 28] = b"Secp256k1_HashToCurve_Cashu_";

/// DHKE error
#[derive(Debug, Error)]
pub enum Error {
    /// No valid curve point found within the counter range
    #[error("no valid point found on the curve")]
    HashToCurveExhausted,
    /// Secp256k1 error
    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
    /// Public key error
    #[error(transparent)]
    PublicKey(#[from] crate::nuts::nut01::Error),
    /// Could not find amount key in mint's keyset for a promise
    #[error("unknown amount key: {0}")]
    AmountKey(crate::Amount),
}

/// Hash a message onto the secp256k1 curve, domain-separated for Cashu.
///
/// `Y = PublicKey(sha256(sha256(DOMAIN_SEPARATOR || msg) || counter))`, where
/// `counter` is a 4-byte little-endian integer starting at 0, tried until the
/// candidate 33-byte `0x02 || hash` decodes as a valid compressed point.
pub fn hash_to_curve(message: &[u8]) -> Result<PublicKey, Error> {
    use bitcoin::hashes::{sha256, Hash};

    let msg_hash = sha256::Hash::hash(&[DOMAIN_SEPARATOR.as_slice(), message].concat());

    for counter in 0u32..=u32::MAX {
        let to_hash = [msg_hash.as_byte_array().as_slice(), &counter.to_le_bytes()].concat();
        let attempt = sha256::Hash::hash(&to_hash);

        let mut candidate = [0u8; 33];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(attempt.as_byte_array());

        if let Ok(point) = Secp256k1PublicKey::from_slice(&candidate) {
            return Ok(PublicKey::from(point));
        }
    }

    Err(Error::HashToCurveExhausted)
}

/// Blind a secret message: `Y = hash_to_curve(secret)`, `r` random (or
/// supplied, for NUT-13 deterministic secrets), `B_ = Y + r*G`.
///
/// Returns `(B_, r)`.
pub fn blind_message(
    secret: &[u8],
    blinding_factor: Option<SecretKey>,
) -> Result<(PublicKey, SecretKey), Error> {
    let y = hash_to_curve(secret)?;

    let r = blinding_factor.unwrap_or_else(SecretKey::generate);

    let blinded = y.combine(&r.public_key())?;

    Ok((PublicKey::from(blinded), r))
}

/// Unblind a mint's blind signature: `C = C_ - r*A`, where `A` is the mint's
/// public key for the proof's amount/keyset.
pub fn unblind_message(
    blinded_signature: PublicKey,
    r: SecretKey,
    mint_pubkey: PublicKey,
) -> Result<PublicKey, Error> {
    let tweaked = (*mint_pubkey).mul_tweak(&SECP256K1, &r.to_scalar())?;
    let negated = tweaked.negate(&SECP256K1);

    let unblinded = blinded_signature.combine(&negated)?;

    Ok(PublicKey::from(unblinded))
}

/// Assemble spendable [`Proof`]s from the mint's blind signatures, the
/// blinding factors and secrets used to request them, and the mint's
/// published keys for the keyset in question.
pub fn construct_proofs(
    promises: Vec<BlindSignature>,
    rs: Vec<SecretKey>,
    secrets: Vec<Secret>,
    keys: &Keys,
) -> Result<Proofs, Error> {
    let mut proofs = Vec::with_capacity(promises.len());

    for ((promise, r), secret) in promises.into_iter().zip(rs).zip(secrets) {
        let a = keys
            .amount_key(promise.amount)
            .ok_or(Error::AmountKey(promise.amount))?;

        let c = unblind_message(promise.c, r, *a)?;

        proofs.push(Proof::new(promise.amount, promise.keyset_id, secret, c));
    }

    Ok(proofs)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_hash_to_curve_vectors() {
        let cases = [
            (
                "0000000000000000000000000000000000000000000000000000000000000000",
                "0266687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "02ec4916dd28fc4c10d78e287ca5d9cc51ee1ae73cbfde08c6b37324cbfaac8bc5",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000002",
                "02076c988b353fcbb748178ecb286bc9d0b4acf474d4ba31ba62334e46c97c416a",
            ),
        ];

        for (message_hex, expected_y_hex) in cases {
            let message = hex::decode(message_hex).unwrap();
            let y = hash_to_curve(&message).unwrap();
            assert_eq!(y, PublicKey::from_hex(expected_y_hex).unwrap());
        }
    }

    #[test]
    fn test_hash_to_curve_is_deterministic_and_varies_with_input() {
        let a = hash_to_curve(b"foo").unwrap();
        let b = hash_to_curve(b"foo").unwrap();
        let c = hash_to_curve(b"bar").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_blind_unblind_round_trip() {
        let secret = Secret::generate();
        let r = SecretKey::generate();
        let (blinded, r) = blind_message(secret.as_bytes(), Some(r)).unwrap();

        let mint_key = SecretKey::generate();
        let mint_pubkey = mint_key.public_key();

        // C_ = blinded * a (the mint's signing step), emulated here directly
        // since signing is a mint-side operation outside this crate's scope.
        let signed = (*blinded)
            .mul_tweak(&SECP256K1, &mint_key.as_scalar())
            .unwrap();

        let unblinded = unblind_message(PublicKey::from(signed), r, mint_pubkey).unwrap();

        // C should equal Y * a: verify by recomputing via the same secret.
        let y = hash_to_curve(secret.as_bytes()).unwrap();
        let expected = (*y).mul_tweak(&SECP256K1, &mint_key.as_scalar()).unwrap();
        assert_eq!(unblinded, PublicKey::from(expected));
    }

    #[test]
    fn test_construct_proofs_unknown_amount_key() {
        let keys = Keys::new(Default::default());
        let promise = BlindSignature {
            amount: crate::Amount::from(4),
            keyset_id: crate::nuts::Id::from_str("009a1f293253e41e").unwrap(),
            c: SecretKey::generate().public_key(),
            dleq: None,
        };

        let result = construct_proofs(
            vec![promise],
            vec![SecretKey::generate()],
            vec![Secret::generate()],
            &keys,
        );

        assert!(result.is_err());
    }
}
