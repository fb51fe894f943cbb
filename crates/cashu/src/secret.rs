// MIT License
// Copyright (c) 2023 Clark Moody
// https://github.com/clarkmoody/cashu-rs/blob/master/src/secret.rs

use core::fmt;
use core::str::FromStr;

use bitcoin::secp256k1::rand::{self, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Secret error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid UTF-8
    #[error(transparent)]
    Utf8(#[from] core::str::Utf8Error),
}

/// The secret data that allows spending ecash.
///
/// For deterministic (NUT-13) secrets this is the hex-encoded derived
/// secret key; for random secrets it is base64url-encoded entropy. Either
/// way the wire form is the string itself, not raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Default for Secret {
    fn default() -> Self {
        Self::generate()
    }
}

impl Secret {
    const BIT_LENGTH: usize = 128;

    /// Create a new random secret.
    pub fn new<S>(secret: S) -> Self
    where
        S: Into<String>,
    {
        Self(secret.into())
    }

    /// Generate a fresh random secret (128 bits of entropy, base64url-encoded).
    pub fn generate() -> Self {
        use bitcoin::base64::{engine::general_purpose::URL_SAFE, Engine as _};

        let mut rng = rand::thread_rng();

        let mut random_bytes = [0u8; Self::BIT_LENGTH / 8];
        rng.fill_bytes(&mut random_bytes);

        Self(URL_SAFE.encode(random_bytes))
    }

    /// The secret's bytes, as they are hashed to curve and hashed into a `y`
    /// value: the UTF-8 bytes of the secret string itself, not a decoding of
    /// it.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Borrow the secret's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for Secret {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
