//! Keysets
//!
//! <https://github.com/cashubtc/nuts/blob/main/02.md>

use std::fmt;
use std::str::FromStr;

use bitcoin::base64::engine::{general_purpose, GeneralPurpose};
use bitcoin::base64::{alphabet, Engine as _};
use bitcoin::hashes::{sha256, Hash, HashEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nut01::Keys;
use crate::CurrencyUnit;

/// Keyset id error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Unknown version byte
    #[error("Unknown keyset id version: {0:02x}")]
    UnknownVersion(u8),
    /// Wrong length for a keyset id
    #[error("Invalid keyset id length: {0}")]
    Length(usize),
    /// Invalid hex
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Invalid base64
    #[error("Invalid base64: {0}")]
    Base64(#[from] bitcoin::base64::DecodeError),
}

/// Keyset id version, encoded in its leading byte.
///
/// NUT-13's HMAC-SHA256-derived 33-byte keyset form is out of scope for this
/// wallet (it never carries the BIP-32 hardened-path derivation this crate
/// implements); only the original 8-byte form is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySetVersion {
    /// The only keyset id version this wallet understands: 1-byte version +
    /// 7-byte body, derived with NUT-13's BIP-32 hardened-path scheme.
    Version00,
}

impl KeySetVersion {
    fn from_byte(b: u8) -> Result<Self, Error> {
        match b {
            0x00 => Ok(Self::Version00),
            b => Err(Error::UnknownVersion(b)),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::Version00 => 0x00,
        }
    }
}

/// Keyset identifier.
///
/// Two incompatible wire forms circulate in the wild and both are accepted on
/// parse: the modern `Hex` form (a 1-byte version tag followed by a 7-byte
/// body, 16 hex chars) and the legacy `Base64` form predating the version
/// byte (9 raw bytes, 12 base64 characters, no version tag). New ids are
/// always *derived* in the modern form; the legacy variant only exists to
/// round-trip ids read from older tokens and mints.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id {
    /// `"00" || hex(7-byte body)`
    Hex([u8; 8]),
    /// 9 raw bytes, base64-encoded, no version byte
    Base64([u8; 9]),
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl Id {
    const LEGACY_BYTES: usize = 9;
    const LEGACY_STRLEN: usize = 12;

    /// Which derivation scheme this id implies.
    pub fn get_version(&self) -> KeySetVersion {
        match self {
            Self::Hex(_) => KeySetVersion::Version00,
            Self::Base64(_) => KeySetVersion::Version00,
        }
    }

    /// Raw bytes, version byte included for the modern form.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Self::Hex(bytes) => bytes.to_vec(),
            Self::Base64(bytes) => bytes.to_vec(),
        }
    }

    /// Parse from raw bytes (version byte included), the modern form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 8 {
            return Err(Error::Length(bytes.len()));
        }
        KeySetVersion::from_byte(bytes[0])?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(Self::Hex(arr))
    }

    fn from_legacy_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::LEGACY_BYTES {
            return Err(Error::Length(bytes.len()));
        }
        let mut arr = [0u8; 9];
        arr.copy_from_slice(bytes);
        Ok(Self::Base64(arr))
    }
}

/// Reduce a keyset id to the 31-bit integer used as a NUT-13 derivation
/// path index (big-endian byte value, mod `2^31 - 1`).
impl From<Id> for u32 {
    fn from(id: Id) -> Self {
        let bytes = id.to_bytes();
        let modulus: u64 = (1u64 << 31) - 1;
        let mut acc: u64 = 0;
        for byte in bytes {
            acc = ((acc << 8) | u64::from(byte)) % modulus;
        }
        acc as u32
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 16 {
            if let Ok(bytes) = hex::decode(s) {
                if let Ok(id) = Self::from_bytes(&bytes) {
                    return Ok(id);
                }
            }
        }

        if s.len() == Self::LEGACY_STRLEN {
            let decode_config = general_purpose::GeneralPurposeConfig::new()
                .with_decode_padding_mode(bitcoin::base64::engine::DecodePaddingMode::Indifferent);
            if let Ok(decoded) =
                GeneralPurpose::new(&alphabet::STANDARD, decode_config).decode(s)
            {
                if let Ok(id) = Self::from_legacy_bytes(&decoded) {
                    return Ok(id);
                }
            }
        }

        let decode_config = general_purpose::GeneralPurposeConfig::new()
            .with_decode_padding_mode(bitcoin::base64::engine::DecodePaddingMode::Indifferent);
        let decoded = GeneralPurpose::new(&alphabet::URL_SAFE, decode_config).decode(s)?;
        Self::from_bytes(&decoded)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex(bytes) => write!(f, "{}", hex::encode(bytes)),
            Self::Base64(bytes) => {
                write!(f, "{}", general_purpose::STANDARD.encode(bytes))
            }
        }
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Id::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Derive a keyset id from its public keys.
///
/// Sorts by amount ascending (guaranteed by `Keys`'s `BTreeMap` storage) and
/// hashes the concatenated raw compressed pubkey bytes; the id is the
/// version byte followed by the first 7 bytes of that hash.
impl From<&Keys> for Id {
    fn from(keys: &Keys) -> Self {
        let mut engine = sha256::HashEngine::default();
        for (_, public_key) in keys.iter() {
            engine.input(&public_key.to_bytes());
        }
        let hash = sha256::Hash::from_engine(engine);

        let mut body = [0u8; 8];
        body[0] = KeySetVersion::Version00.to_byte();
        body[1..].copy_from_slice(&hash.as_byte_array()[..7]);
        Self::Hex(body)
    }
}

/// Keyset metadata, as returned by a mint's `GET /v1/keysets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetInfo {
    /// Keyset id
    pub id: Id,
    /// Currency unit this keyset signs for
    pub unit: CurrencyUnit,
    /// Whether the mint currently signs new outputs with this keyset
    pub active: bool,
    /// Fee, in parts-per-thousand, charged per input spent from this keyset
    pub input_fee_ppk: u64,
    /// Unix timestamp after which the mint will stop honoring this keyset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_expiry: Option<u64>,
}

/// Response body for `GET /v1/keysets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetResponse {
    /// Known keysets
    pub keysets: Vec<KeySetInfo>,
}

/// A keyset's public keys, as returned by `GET /v1/keys[/{id}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    /// Keyset id
    pub id: Id,
    /// Currency unit this keyset signs for
    pub unit: CurrencyUnit,
    /// Public keys, by amount
    pub keys: Keys,
}

/// Response body for `GET /v1/keys[/{id}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysResponse {
    /// Keysets
    pub keysets: Vec<KeySet>,
}
