//! BIP-39 mnemonic handling
//!
//! Thin wrapper around the [`bip39`] crate: generates a fresh 12-word English
//! mnemonic, parses one back from words, and derives the 64-byte BIP-32 seed
//! ([`super::nuts::nut13`] turns that seed into deterministic secrets).

use bip39::Mnemonic as Bip39Mnemonic;
use thiserror::Error;

/// Mnemonic error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid mnemonic words
    #[error(transparent)]
    Bip39(#[from] bip39::Error),
}

/// A validated BIP-39 mnemonic phrase.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic(Bip39Mnemonic);

impl Mnemonic {
    /// Generate a fresh, random 12-word English mnemonic (128 bits of entropy).
    pub fn generate() -> Self {
        let mut entropy = [0u8; 16];
        getrandom(&mut entropy);
        Self(Bip39Mnemonic::from_entropy(&entropy).expect("16-byte entropy is always valid"))
    }

    /// Parse a mnemonic from its space-separated words.
    pub fn from_str(words: &str) -> Result<Self, Error> {
        Ok(Self(Bip39Mnemonic::parse_normalized(words)?))
    }

    /// The mnemonic's words, space-separated.
    pub fn words(&self) -> String {
        self.0.to_string()
    }

    /// Derive the 64-byte BIP-32 seed for this mnemonic.
    ///
    /// `passphrase` is the optional BIP-39 25th word; an empty string is the
    /// standard "no passphrase" seed.
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        self.0.to_seed(passphrase)
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Mnemonic").field(&"<redacted>").finish()
    }
}

fn getrandom(buf: &mut [u8]) {
    use bitcoin::secp256k1::rand::RngCore;
    bitcoin::secp256k1::rand::thread_rng().fill_bytes(buf);
}
