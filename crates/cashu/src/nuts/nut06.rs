//! NUT-06: Mint Information
//!
//! <https://github.com/cashubtc/nuts/blob/main/06.md>

use std::collections::HashMap;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::nut01::PublicKey;
use super::{nut04, nut05};

/// Mint Version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintVersion {
    /// Mint Software name
    pub name: String,
    /// Mint Version
    pub version: String,
}

impl Serialize for MintVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let combined = format!("{}/{}", self.name, self.version);
        serializer.serialize_str(&combined)
    }
}

impl<'de> Deserialize<'de> for MintVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let combined = String::deserialize(deserializer)?;
        let parts: Vec<&str> = combined.split('/').collect();
        if parts.len() != 2 {
            return Err(serde::de::Error::custom("Invalid input string"));
        }
        Ok(MintVersion {
            name: parts[0].to_string(),
            version: parts[1].to_string(),
        })
    }
}

/// A single way to reach the mint operator, e.g. `("email", "operator@mint.example")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact Method i.e. nostr
    pub method: String,
    /// Contact Info i.e. npub...
    pub info: String,
}

impl ContactInfo {
    /// Create new [`ContactInfo`]
    pub fn new(method: String, info: String) -> Self {
        Self { method, info }
    }
}

/// Mint Info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    /// name of the mint and should be recognizable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// hex pubkey of the mint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<PublicKey>,
    /// implementation name and the version running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<MintVersion>,
    /// short description of the mint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// long description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_long: Option<String>,
    /// contact methods to reach the mint operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactInfo>>,
    /// shows which NUTs the mint supports
    pub nuts: Nuts,
    /// message of the day that the wallet must display to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
}

/// Which NUTs a mint supports, keyed by NUT number.
///
/// This wallet only needs the full settings for the NUTs it actively drives
/// (mint/melt quotes); everything else is carried as a generic "supported"
/// flag or an opaque JSON value so unrecognized/future NUTs still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nuts(pub HashMap<u8, NutSettings>);

impl Deref for Nuts {
    type Target = HashMap<u8, NutSettings>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for Nuts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (num, settings) in &self.0 {
            map.serialize_entry(&num.to_string(), settings)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Nuts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: HashMap<String, Value> = HashMap::deserialize(deserializer)?;

        let mut nuts = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let num: u8 = key.parse().map_err(serde::de::Error::custom)?;
            let settings = match num {
                4 => NutSettings::Nut04(
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?,
                ),
                5 => NutSettings::Nut05(
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?,
                ),
                6..=15 => NutSettings::Supported(
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?,
                ),
                _ => NutSettings::Unknown(value),
            };
            nuts.insert(num, settings);
        }

        Ok(Nuts(nuts))
    }
}

/// Per-NUT settings as advertised in [`MintInfo::nuts`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutSettings {
    /// NUT-04 mint method settings
    Nut04(nut04::Settings),
    /// NUT-05 melt method settings
    Nut05(nut05::Settings),
    /// A simple supported/unsupported flag
    Supported(SupportedSettings),
    /// A NUT this wallet doesn't interpret, carried through as-is
    Unknown(Value),
}

/// Simple `{"supported": bool}` settings shape used by most optional NUTs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedSettings {
    /// Whether the mint supports this NUT
    pub supported: bool,
}
