//! NUT-05: Melting Tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/05.md>

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BlindSignature, BlindedMessage, CurrencyUnit};
use crate::nuts::Proofs;
use crate::{Amount, Bolt11Invoice};

/// NUT05 Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Unknown melt quote state
    #[error("Unknown melt quote state: {0}")]
    UnknownState(String),
}

/// State of a melt quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteState {
    /// Lightning payment has not been attempted
    Unpaid,
    /// Lightning payment is in flight
    Pending,
    /// Lightning payment succeeded
    Paid,
}

impl fmt::Display for QuoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unpaid => "UNPAID",
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for QuoteState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(Self::Unpaid),
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            other => Err(Error::UnknownState(other.to_string())),
        }
    }
}

/// Melt quote request `POST /v1/melt/quote/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteBolt11Request {
    /// Bolt11 invoice to be paid
    pub request: Bolt11Invoice,
    /// Unit wallet would like to pay with
    pub unit: CurrencyUnit,
}

/// Melt quote response `POST/GET /v1/melt/quote/bolt11[/{id}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteBolt11Response {
    /// Quote Id
    pub quote: String,
    /// The amount, in the invoice's unit, that needs to be provided
    pub amount: u64,
    /// The fee reserve set aside for the Lightning payment
    pub fee_reserve: u64,
    /// State of the quote
    pub state: QuoteState,
    /// Unix timestamp until the quote is valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    /// Preimage of the paid invoice, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Blind signatures for unspent fee-reserve change, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Vec<BlindSignature>>,
}

/// Melt request `POST /v1/melt/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltRequest {
    /// Quote ID
    pub quote: String,
    /// Proofs to spend
    pub inputs: Proofs,
    /// Blinded messages for change from an overpaid fee reserve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<BlindedMessage>>,
}

impl MeltRequest {
    /// Create a new melt request
    pub fn new(quote: String, inputs: Proofs, outputs: Option<Vec<BlindedMessage>>) -> Self {
        Self {
            quote,
            inputs,
            outputs,
        }
    }

    /// Total value of the inputs
    pub fn proofs_amount(&self) -> Result<Amount, crate::amount::Error> {
        Amount::try_sum(self.inputs.iter().map(|proof| proof.amount))
    }
}

/// Melt response `POST /v1/melt/bolt11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltResponse {
    /// State of the quote after the melt attempt
    pub state: QuoteState,
    /// Bolt11 preimage, once the payment succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Blind signatures for unspent fee-reserve change, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Vec<BlindSignature>>,
}

/// Melt method settings, as carried in `GET /v1/info`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltMethodSettings {
    /// Supported `(payment method, unit)` pairs
    pub methods: Vec<(String, CurrencyUnit)>,
    /// Whether melting is currently disabled
    pub disabled: bool,
}

/// Melt settings, as embedded in [`crate::nuts::nut06::MintInfo`]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Supported `(payment method, unit)` pairs
    pub methods: Vec<(String, CurrencyUnit)>,
}
