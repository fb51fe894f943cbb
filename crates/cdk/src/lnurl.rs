//! LNURL-pay resolution for paying a Lightning address instead of a raw
//! invoice (§4.10, C14).
//!
//! Isolated I/O with no teacher counterpart under this name — the spec
//! describes the flow at its interface only, so this is built directly from
//! §4.10 using the same `reqwest`/`serde_json` stack as [`crate::transport`].

use serde::Deserialize;
use url::Url;

use crate::error::Error;

/// `user@domain` resolved to its LNURL-pay well-known endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightningAddress {
    user: String,
    domain: String,
}

impl LightningAddress {
    /// Parse `user@domain`. Neither half may be empty.
    pub fn parse(address: &str) -> Result<Self, Error> {
        let (user, domain) = address
            .split_once('@')
            .ok_or_else(|| Error::LightningAddressInvalid(address.to_string()))?;
        if user.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::LightningAddressInvalid(address.to_string()));
        }
        Ok(Self {
            user: user.to_string(),
            domain: domain.to_string(),
        })
    }

    /// The `.well-known/lnurlp/{user}` endpoint to resolve against.
    pub fn well_known_url(&self) -> Result<Url, Error> {
        let url = format!("https://{}/.well-known/lnurlp/{}", self.domain, self.user);
        Url::parse(&url).map_err(|e| Error::LightningAddressInvalid(e.to_string()))
    }
}

/// The well-known endpoint's JSON reply (§4.10).
#[derive(Debug, Clone, Deserialize)]
struct PayServiceResponse {
    callback: String,
    #[serde(rename = "minSendable")]
    min_sendable: u64,
    #[serde(rename = "maxSendable")]
    max_sendable: u64,
    #[serde(rename = "commentAllowed")]
    comment_allowed: Option<u64>,
}

/// The callback's JSON reply, once an amount has been requested.
#[derive(Debug, Clone, Deserialize)]
struct PayInvoiceResponse {
    pr: String,
}

/// Resolves `user@domain` to a Bolt11 invoice for `amount_msat`.
#[derive(Debug, Clone)]
pub struct LnurlClient {
    inner: reqwest::Client,
}

impl Default for LnurlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LnurlClient {
    /// A client using `reqwest`'s defaults.
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Resolve `user@domain` and fetch an invoice for `amount_msat`,
    /// optionally attaching `comment` if the receiver advertises support
    /// for one large enough.
    pub async fn fetch_invoice(
        &self,
        address: &str,
        amount_msat: u64,
        comment: Option<&str>,
    ) -> Result<String, Error> {
        let address = LightningAddress::parse(address)?;
        let service = self.resolve(&address).await?;

        if amount_msat < service.min_sendable {
            return Err(Error::AmountBelowMin);
        }
        if amount_msat > service.max_sendable {
            return Err(Error::AmountAboveMax);
        }

        let mut callback = Url::parse(&service.callback)
            .map_err(|e| Error::LnurlResolutionFailed(e.to_string()))?;
        callback
            .query_pairs_mut()
            .append_pair("amount", &amount_msat.to_string());
        if let Some(comment) = comment {
            if service.comment_allowed.is_some_and(|max| comment.len() as u64 <= max) {
                callback.query_pairs_mut().append_pair("comment", comment);
            }
        }

        let reply: PayInvoiceResponse = self
            .inner
            .get(callback)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::InvoiceFetchFailed(e.to_string()))?;

        Ok(reply.pr)
    }

    async fn resolve(&self, address: &LightningAddress) -> Result<PayServiceResponse, Error> {
        let url = address.well_known_url()?;
        self.inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?
            .json::<PayServiceResponse>()
            .await
            .map_err(|e| Error::LnurlResolutionFailed(e.to_string()))
    }
}
