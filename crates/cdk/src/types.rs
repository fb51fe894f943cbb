//! Wallet-local types layered on top of the protocol types in [`cashu`]: a
//! mint quote/melt quote cache, a stored proof with its derived metadata, and
//! the outcome of a completed melt (§3 of the spec).

use bitcoin::hashes::{sha256, Hash};
use cashu::nuts::{MeltQuoteState, MintQuoteState, State};
use cashu::{Amount, CurrencyUnit, MintUrl, Proofs, PublicKey, Secret};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Stable identifier for a `(mint, unit)` pair this wallet tracks.
///
/// Derived as the first 16 hex characters of `SHA256(mint_url ++ ":" ++ unit)`
/// so it is deterministic and collision-resistant without round-tripping
/// through the mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    /// Compute the id for a `(mint, unit)` pair.
    pub fn new(mint_url: &MintUrl, unit: &CurrencyUnit) -> Self {
        let preimage = format!("{mint_url}:{unit}");
        let digest = sha256::Hash::hash(preimage.as_bytes());
        Self(hex::encode(digest.as_byte_array())[..16].to_string())
    }

    /// Borrow the id as hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mint quote: a request to mint new ecash against a Lightning invoice, and
/// the mint's last known state for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    /// Quote id assigned by the mint
    pub id: String,
    /// Mint this quote was opened with
    pub mint_url: MintUrl,
    /// Amount the invoice pays for
    pub amount: Amount,
    /// Unit the amount is denominated in
    pub unit: CurrencyUnit,
    /// Bolt11 invoice the wallet must pay to fund the quote
    pub request: String,
    /// Last known state of the quote
    pub state: MintQuoteState,
    /// Unix timestamp the quote expires at, if supplied
    pub expiry: Option<u64>,
}

/// A melt quote: a request to pay a Lightning invoice by burning ecash, and
/// the mint's last known state for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuote {
    /// Quote id assigned by the mint
    pub id: String,
    /// Mint this quote was opened with
    pub mint_url: MintUrl,
    /// Unit the amount/fee_reserve are denominated in
    pub unit: CurrencyUnit,
    /// The invoice being paid
    pub request: String,
    /// Amount, in `unit`, that must be provided from proofs
    pub amount: Amount,
    /// Fee reserve set aside for the Lightning payment
    pub fee_reserve: Amount,
    /// Last known state of the quote
    pub state: MeltQuoteState,
    /// Unix timestamp the quote expires at, if supplied
    pub expiry: Option<u64>,
    /// Preimage of the paid invoice, once known
    pub payment_preimage: Option<String>,
}

/// A proof together with the wallet-local metadata needed to track and spend
/// it: which mint/unit it belongs to, its `y` value for state checks, and its
/// last known spend state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    /// The proof itself
    pub proof: cashu::Proof,
    /// `y = hash_to_curve(secret)`, used to query `/v1/checkstate`
    pub y: PublicKey,
    /// Mint this proof was issued by
    pub mint_url: MintUrl,
    /// Last known spend state
    pub state: State,
    /// Unit this proof is denominated in
    pub unit: CurrencyUnit,
    /// The mint quote this proof was produced for, if it came from `mint()`.
    /// Lets a crashed-and-restarted caller find proofs it never observed via
    /// `find_proofs_by_quote` instead of re-minting.
    pub mint_quote_id: Option<String>,
    /// Unix timestamp this row was written
    pub created_at: u64,
    /// Unix timestamp the proof transitioned to `SPENT`, if it has
    pub spent_at: Option<u64>,
}

impl ProofInfo {
    /// Wrap a proof, computing its `y` value.
    pub fn new(
        proof: cashu::Proof,
        mint_url: MintUrl,
        state: State,
        unit: CurrencyUnit,
        mint_quote_id: Option<String>,
    ) -> Result<Self, Error> {
        let y = proof.y()?;
        Ok(Self {
            proof,
            y,
            mint_url,
            state,
            unit,
            mint_quote_id,
            created_at: cashu::util::unix_time(),
            spent_at: None,
        })
    }

    /// The proof's secret, used as the store's primary key.
    pub fn secret(&self) -> &Secret {
        &self.proof.secret
    }
}

/// The outcome of a completed melt: whether the payment went through, the
/// preimage if so, and any change returned from an overpaid fee reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Melted {
    /// State of the melt quote after the attempt
    pub state: MeltQuoteState,
    /// Preimage of the paid invoice, if the payment succeeded
    pub preimage: Option<String>,
    /// Change proofs returned for an overpaid fee reserve
    pub change: Option<Proofs>,
    /// Amount of the invoice that was paid
    pub amount: Amount,
    /// Fee actually paid: `inputs - amount - change`
    pub fee_paid: Amount,
}

impl Melted {
    /// Build a [`Melted`] from the quote amount, the proofs spent, and any
    /// change returned, computing the fee actually paid.
    ///
    /// `change` proofs are valued separately rather than via [`Amount`]'s
    /// subtraction operator, which panics on underflow; a malformed
    /// melt response (change exceeding the proofs spent) is reported as
    /// [`Error::AmountMismatch`] instead of panicking.
    pub fn from_proofs(
        state: MeltQuoteState,
        amount: Amount,
        preimage: Option<String>,
        change_proofs: Option<Proofs>,
        proofs_amount: Amount,
    ) -> Result<Self, Error> {
        let change_amount = match &change_proofs {
            Some(proofs) => proofs.iter().try_fold(0u64, |acc, p| {
                acc.checked_add(p.amount.to_sat())
                    .ok_or(Error::AmountMismatch)
            })?,
            None => 0,
        };

        let spent = proofs_amount
            .to_sat()
            .checked_sub(change_amount)
            .ok_or(Error::AmountMismatch)?;
        let fee_paid = spent
            .checked_sub(amount.to_sat())
            .ok_or(Error::AmountMismatch)?;

        Ok(Self {
            state,
            preimage,
            change: change_proofs,
            amount,
            fee_paid: Amount::from_sat(fee_paid),
        })
    }
}
