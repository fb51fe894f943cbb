//! NUT-09: Restore signatures
//!
//! <https://github.com/cashubtc/nuts/blob/main/09.md>

use serde::{Deserialize, Serialize};

use super::nut00::BlindSignature;
use super::BlindedMessage;

/// Restore Request `POST /v1/restore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRequest {
    /// Outputs to restore signatures for
    pub outputs: Vec<BlindedMessage>,
}

/// Restore Response
///
/// The mint echoes back only the `outputs` it actually has a stored
/// signature for, paired positionally with that signature — a client
/// deriving a contiguous range of deterministic secrets uses this to find
/// where the already-issued proofs end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResponse {
    /// Outputs the mint found a signature for
    pub outputs: Vec<BlindedMessage>,
    /// Signatures for `outputs`, in the same order
    pub signatures: Vec<BlindSignature>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::nuts::{Id, PublicKey};
    use crate::Amount;

    #[test]
    fn test_restore_request_round_trip() {
        let request = RestoreRequest {
            outputs: vec![BlindedMessage {
                amount: Amount::from(8),
                keyset_id: Id::from_str("009a1f293253e41e").unwrap(),
                blinded_secret: PublicKey::from_hex(
                    "02194603ffa36356f4a56b7df9371fc3192472351453ec7398b8da8117e7c3e37",
                )
                .unwrap(),
                witness: None,
            }],
        };

        let serialized = serde_json::to_string(&request).unwrap();
        let deserialized: RestoreRequest = serde_json::from_str(&serialized).unwrap();
        assert_eq!(request, deserialized);
    }
}
