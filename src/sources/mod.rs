/// Sources module
///
/// One cache-aside fetcher per upstream credential. The ticket fetcher is
/// a strict sequential dependent of the access-token fetcher and never
/// talks to the token endpoint itself.

pub mod access_token;
pub mod js_ticket;

pub use access_token::AccessTokenSource;
pub use js_ticket::JsTicketSource;

use crate::parser::{DecodeError, ProviderError};

/// Failure of one fetch call. Propagates unchanged through the credential
/// chain; never cached, never retried — the next call walks the same path.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Upstream answered with its error envelope.
    #[error("provider refused: errcode {}, {}", .0.errcode, .0.errmsg)]
    Provider(ProviderError),
    /// Upstream answered with a body matching neither documented shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Network-level failure talking to upstream.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Stable label for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Provider(_) => "provider",
            FetchError::Decode(_) => "decode",
            FetchError::Transport(_) => "transport",
        }
    }
}
