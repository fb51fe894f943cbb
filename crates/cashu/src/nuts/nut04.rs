//! NUT-04: Mint Tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/04.md>

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BlindSignature, BlindedMessage, CurrencyUnit};
use crate::Amount;

/// NUT04 Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Unknown mint quote state
    #[error("Unknown mint quote state: {0}")]
    UnknownState(String),
}

/// State of a mint quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MintQuoteState {
    /// Lightning invoice has not been paid
    Unpaid,
    /// Lightning invoice has been paid, outputs not yet signed
    Paid,
    /// Outputs have been signed, quote is spent
    Issued,
}

impl fmt::Display for MintQuoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Issued => "ISSUED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MintQuoteState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            "ISSUED" => Ok(Self::Issued),
            other => Err(Error::UnknownState(other.to_string())),
        }
    }
}

/// Mint quote request `POST /v1/mint/quote/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuoteBolt11Request {
    /// Amount
    pub amount: Amount,
    /// Unit wallet would like to mint
    pub unit: CurrencyUnit,
}

/// Mint quote response `POST/GET /v1/mint/quote/bolt11[/{id}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuoteBolt11Response {
    /// Quote Id
    pub quote: String,
    /// Payment request to fulfil
    pub request: String,
    /// State of the quote
    pub state: MintQuoteState,
    /// Unix timestamp until the quote is valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// Mint request `POST /v1/mint/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    /// Quote id
    pub quote: String,
    /// Outputs
    pub outputs: Vec<BlindedMessage>,
}

impl MintRequest {
    /// Total amount requested across all outputs
    pub fn total_amount(&self) -> Result<Amount, crate::amount::Error> {
        Amount::try_sum(self.outputs.iter().map(|o| o.amount))
    }
}

/// Mint response `POST /v1/mint/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintResponse {
    /// Blind signatures
    pub signatures: Vec<BlindSignature>,
}

/// Mint method settings, as carried in `GET /v1/info`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintMethodSettings {
    /// `(payment method, unit)` pairs this mint accepts for minting
    pub methods: Vec<(String, CurrencyUnit)>,
    /// Whether minting is currently disabled
    pub disabled: bool,
}

/// Mint settings, as embedded in [`crate::nuts::nut06::MintInfo`]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Supported `(payment method, unit)` pairs
    pub methods: Vec<(String, CurrencyUnit)>,
    /// Whether minting is currently disabled
    pub disabled: bool,
}
