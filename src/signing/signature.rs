//! JS-SDK request signing.
//!
//! The signature is the SHA-1 hex digest of a canonical serialization of
//! `{jsapi_ticket, noncestr, timestamp, url}`: pairs sorted by key,
//! rendered `key=value` and joined with `&`, no trailing separator. The
//! hash is order- and format-sensitive, so the construction lives in free
//! functions that are pure and directly testable against fixed vectors.

use std::collections::BTreeMap;

use rand::Rng;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;
use crate::sources::{FetchError, JsTicketSource};

pub const NONCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const NONCE_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// Caller-supplied URL has no parseable domain segment.
    #[error("bad url")]
    BadUrl,
    /// Domain is not in the configured allow-list.
    #[error("domain isn't in whitelist")]
    ForbiddenDomain,
    /// Ticket chain failed; propagated verbatim.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl SignError {
    pub fn reason(&self) -> &'static str {
        match self {
            SignError::BadUrl => "bad_url",
            SignError::ForbiddenDomain => "forbidden_domain",
            SignError::Fetch(e) => e.reason(),
        }
    }
}

/// Signed parameters handed back to the client-side SDK. Transient:
/// built, hashed and returned per call, never persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SignedPayload {
    pub signature: String,
    pub nonce: String,
    pub timestamp: i64,
}

/// Domain of a URL: the third `/`-separated segment
/// (`scheme:` / `` / `domain` / ...). None when absent or empty.
pub fn extract_domain(url: &str) -> Option<&str> {
    url.split('/').nth(2).filter(|domain| !domain.is_empty())
}

/// 16 random characters from `[A-Z0-9]`.
pub fn random_noncestr() -> String {
    let mut rng = rand::rng();
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

pub fn canonical_string(jsapi_ticket: &str, noncestr: &str, timestamp: i64, url: &str) -> String {
    let mut params = BTreeMap::new();
    params.insert("jsapi_ticket", jsapi_ticket.to_owned());
    params.insert("noncestr", noncestr.to_owned());
    params.insert("timestamp", timestamp.to_string());
    params.insert("url", url.to_owned());

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Pure signing core: SHA-1 hex over the canonical string.
pub fn sign_with(jsapi_ticket: &str, noncestr: &str, timestamp: i64, url: &str) -> String {
    let canonical = canonical_string(jsapi_ticket, noncestr, timestamp, url);
    hex::encode(Sha1::digest(canonical.as_bytes()))
}

/// Validates the target URL, obtains a fresh ticket through the cache
/// chain and produces the one-time signature payload.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    tickets: JsTicketSource,
    allowed_domains: Vec<String>,
}

impl SignatureEngine {
    pub fn new(tickets: JsTicketSource, allowed_domains: Vec<String>) -> Self {
        Self { tickets, allowed_domains }
    }

    pub async fn sign(&self, url: &str) -> Result<SignedPayload, SignError> {
        let metrics = get_metrics().await;
        metrics.signature_requests.inc();

        let result = self.validate_and_sign(url).await;
        if let Err(e) = &result {
            metrics.signature_rejections.with_label_values(&[e.reason()]).inc();
        }
        result
    }

    async fn validate_and_sign(&self, url: &str) -> Result<SignedPayload, SignError> {
        let domain = extract_domain(url).ok_or(SignError::BadUrl)?;
        if !self.allowed_domains.iter().any(|allowed| allowed == domain) {
            return Err(SignError::ForbiddenDomain);
        }

        let ticket = self.tickets.fetch().await?;
        let noncestr = random_noncestr();
        let timestamp = now_i64();
        let signature = sign_with(&ticket, &noncestr, timestamp, url);
        debug!(domain, timestamp, "signed url");

        Ok(SignedPayload { signature, nonce: noncestr, timestamp })
    }
}
