//! Cashu protocol types and cryptography.
//!
//! This crate provides the building blocks a Cashu wallet needs: the blind
//! Diffie-Hellman key exchange (BDHKE) used to mint and redeem ecash, NUT-13
//! deterministic secret derivation, and the V3/V4 token wire formats. It does
//! not implement mint-side behavior, Lightning invoice validation, or
//! spending-condition (P2PK/HTLC) verification — those stay out of scope.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod amount;
pub mod dhke;
pub mod error;
pub mod mint_url;
pub mod mnemonic;
pub mod nuts;
pub mod secret;
pub mod util;
pub mod utils;

pub use lightning_invoice::{self, Bolt11Invoice};

pub use self::amount::Amount;
pub use self::error::Error;
pub use self::mint_url::MintUrl;
pub use self::mnemonic::Mnemonic;
pub use self::nuts::*;
pub use self::secret::Secret;
pub use self::util::SECP256K1;

#[doc(hidden)]
#[macro_export]
macro_rules! ensure_cdk {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
