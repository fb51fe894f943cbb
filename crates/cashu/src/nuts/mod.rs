//! Nuts
//!
//! See all at <https://github.com/cashubtc/nuts>

pub mod nut00;
pub mod nut01;
pub mod nut02;
pub mod nut03;
pub mod nut04;
pub mod nut05;
pub mod nut06;
pub mod nut07;
pub mod nut09;
pub mod nut13;

pub use nut00::{
    BlindSignature, BlindSignatureDleq, BlindedMessage, CurrencyUnit, Proof, ProofDleq, Proofs,
    ProofsMethods, Token, TokenV3, TokenV4,
};
pub use nut00::{PreMint, PreMintSecrets};
pub use nut01::{Keys, PublicKey, SecretKey};
pub use nut02::{Id, KeySet, KeySetInfo, KeySetVersion, KeysResponse, KeysetResponse};
pub use nut03::{SwapRequest, SwapResponse};
pub use nut03::PreSwap;
pub use nut04::{
    MintMethodSettings, MintQuoteBolt11Request, MintQuoteBolt11Response, MintQuoteState,
    MintRequest, MintResponse, Settings as NUT04Settings,
};
pub use nut05::{
    MeltMethodSettings, MeltQuoteBolt11Request, MeltQuoteBolt11Response, MeltRequest,
    MeltResponse, QuoteState as MeltQuoteState, Settings as NUT05Settings,
};
pub use nut06::{ContactInfo, MintInfo, MintVersion, Nuts};
pub use nut07::{CheckStateRequest, CheckStateResponse, ProofState, State};
pub use nut09::{RestoreRequest, RestoreResponse};
