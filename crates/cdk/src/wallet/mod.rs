//! Wallet orchestration (§4.7, C11): stitches [`crate::transport`],
//! [`crate::store`] and the protocol primitives in `cashu` into the public
//! `mint`/`swap`/`split`/`receive`/`melt`/`restore` operations.

mod core;

pub use self::core::{select_proofs_for_amount, WalletCore};
