//! Wallet error kinds (§7 of the spec).
//!
//! Lower-level crypto/codec failures stay typed in [`cashu::Error`] and are
//! composed in here via `#[from]`, matching the teacher's per-crate error
//! enum pattern (`wallet::Error` wrapping `cashu::nut00::Error` etc.).

use cashu::nuts::Id;
use cashu::{Amount, CurrencyUnit, MintUrl};
use thiserror::Error;

/// Top-level wallet error.
#[derive(Debug, Error)]
pub enum Error {
    /// No mnemonic has been loaded into this wallet (§4.7.11 Safe-State gate)
    #[error("no seed configured")]
    NoSeed,
    /// A seed is configured but no durable store backs it; producing outputs
    /// would risk reusing a NUT-13 counter across process restarts
    #[error("unsafe state: seed configured without durable storage")]
    UnsafeState,
    /// `generate_mnemonic` was called without a durable store configured
    #[error("a durable store is required to generate a mnemonic")]
    StorageRequired,
    /// The supplied phrase did not parse as a valid BIP-39 mnemonic
    #[error("invalid mnemonic")]
    InvalidMnemonic,
    /// The mint has no active keyset for the wallet's unit
    #[error("no active keyset for unit {unit}")]
    NoActiveKeyset {
        /// Unit the wallet is bound to
        unit: CurrencyUnit,
        /// Units the mint actually offers
        available: Vec<CurrencyUnit>,
    },
    /// A proof or signature referenced an unrecognized keyset id
    #[error("unknown keyset: {0}")]
    UnknownKeyset(Id),
    /// A keyset has no key for the requested amount
    #[error("keyset {keyset_id} has no key for amount {amount}")]
    UnknownAmount {
        /// Keyset queried
        keyset_id: Id,
        /// Amount with no matching key
        amount: Amount,
    },
    /// A token names a mint other than the one this wallet is bound to
    #[error("wrong mint: expected {expected}, got {got}")]
    WrongMint {
        /// This wallet's mint
        expected: MintUrl,
        /// The mint named by the token
        got: MintUrl,
    },
    /// Swap/melt inputs and outputs did not balance once fees are accounted for
    #[error("amount mismatch")]
    AmountMismatch,
    /// Not enough UNSPENT proofs to cover the requested amount
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Total available
        have: Amount,
        /// Total required
        need: Amount,
    },
    /// A token string carried a prefix other than `cashuA`/`cashuB`
    #[error("unknown token prefix")]
    TokenPrefixUnknown,
    /// A token payload failed to decode as V3 or V4
    #[error("token decode error: {0}")]
    TokenDecodeError(String),
    /// `user@domain` did not parse as a Lightning address
    #[error("invalid lightning address: {0}")]
    LightningAddressInvalid(String),
    /// LNURL-pay well-known resolution failed
    #[error("lnurl resolution failed: {0}")]
    LnurlResolutionFailed(String),
    /// Requested amount is below the LNURL-pay `minSendable`
    #[error("amount below the receiver's minimum sendable")]
    AmountBelowMin,
    /// Requested amount is above the LNURL-pay `maxSendable`
    #[error("amount above the receiver's maximum sendable")]
    AmountAboveMax,
    /// The LNURL-pay callback did not yield a usable invoice
    #[error("invoice fetch failed: {0}")]
    InvoiceFetchFailed(String),
    /// The mint rejected a request (HTTP status >= 400)
    #[error("protocol error: {message}")]
    ProtocolError {
        /// Mint-supplied detail message
        message: String,
        /// Mint-supplied machine-readable code, if any
        code: Option<i32>,
    },
    /// Transport-level failure reaching the mint or an LNURL endpoint
    #[error("network error: {0}")]
    NetworkError(String),
    /// Lower-level cashu crypto/codec error
    #[error(transparent)]
    Cashu(#[from] cashu::Error),
    /// Durable-store failure
    #[error(transparent)]
    Store(#[from] crate::store::Error),
}
