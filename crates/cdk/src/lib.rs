//! Cashu wallet-core.
//!
//! Orchestrates the cryptography in [`cashu`] against a mint over HTTP:
//! mint/melt/swap/send/receive flows, NUT-13 deterministic secret recovery,
//! proof and counter persistence, and LNURL-pay resolution for paying a
//! Lightning address instead of a raw invoice.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod error;
pub mod lnurl;
pub mod store;
pub mod transport;
pub mod types;
pub mod wallet;

pub use self::error::Error;
pub use self::types::{Melted, MeltQuote, MintQuote, ProofInfo, WalletId};
pub use self::wallet::WalletCore;
