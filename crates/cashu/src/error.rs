//! Crate-wide error type
//!
//! Aggregates the per-module errors so callers that don't care which layer
//! failed can propagate a single [`Error`] with `?`.

use thiserror::Error;

/// Top level error
#[derive(Debug, Error)]
pub enum Error {
    /// NUT00 error
    #[error(transparent)]
    NUT00(#[from] crate::nuts::nut00::Error),
    /// NUT01 error
    #[error(transparent)]
    NUT01(#[from] crate::nuts::nut01::Error),
    /// NUT02 error
    #[error(transparent)]
    NUT02(#[from] crate::nuts::nut02::Error),
    /// NUT03 error
    #[error(transparent)]
    NUT03(#[from] crate::nuts::nut03::Error),
    /// NUT04 error
    #[error(transparent)]
    NUT04(#[from] crate::nuts::nut04::Error),
    /// NUT05 error
    #[error(transparent)]
    NUT05(#[from] crate::nuts::nut05::Error),
    /// NUT07 error
    #[error(transparent)]
    NUT07(#[from] crate::nuts::nut07::Error),
    /// NUT13 error
    #[error(transparent)]
    NUT13(#[from] crate::nuts::nut13::Error),
    /// DHKE error
    #[error(transparent)]
    DHKE(#[from] crate::dhke::Error),
    /// Amount error
    #[error(transparent)]
    Amount(#[from] crate::amount::Error),
    /// Secret error
    #[error(transparent)]
    Secret(#[from] crate::secret::Error),
    /// Mint URL error
    #[error(transparent)]
    MintUrl(#[from] crate::mint_url::Error),
    /// Mnemonic error
    #[error(transparent)]
    Mnemonic(#[from] crate::mnemonic::Error),
}
