//! Mint public key exchange
//!
//! <https://github.com/cashubtc/nuts/blob/main/01.md>

pub mod public_key;
pub mod secret_key;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::public_key::PublicKey;
pub use self::secret_key::SecretKey;
use crate::Amount;

/// Nut01 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid public key size
    #[error("Invalid public key size: expected {expected}, found {found}")]
    InvalidPublicKeySize {
        /// Expected size
        expected: usize,
        /// Found size
        found: usize,
    },
    /// Secp256k1 error
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
}

/// Mint public keys, keyed by the denomination they sign for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keys(BTreeMap<Amount, PublicKey>);

impl Keys {
    /// Create new [`Keys`]
    pub fn new(keys: BTreeMap<Amount, PublicKey>) -> Self {
        Self(keys)
    }

    /// Get the public key for `amount`, if this keyset signs it.
    pub fn amount_key(&self, amount: Amount) -> Option<&PublicKey> {
        self.0.get(&amount)
    }

    /// Iterate over `(amount, public_key)` pairs, in ascending amount order.
    pub fn iter(&self) -> impl Iterator<Item = (&Amount, &PublicKey)> {
        self.0.iter()
    }

    /// Number of denominations in this keyset.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this keyset has no denominations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Into the inner map.
    pub fn into_inner(self) -> BTreeMap<Amount, PublicKey> {
        self.0
    }
}

impl From<BTreeMap<Amount, PublicKey>> for Keys {
    fn from(keys: BTreeMap<Amount, PublicKey>) -> Self {
        Self(keys)
    }
}
