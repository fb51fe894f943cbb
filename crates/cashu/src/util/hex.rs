//! Thin re-export of the `hex` crate, so callers can `use crate::util::hex`.

pub use hex::{decode, encode, FromHexError};
