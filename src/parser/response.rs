//! Parsing of upstream replies.
//!
//! Both provider endpoints answer with a tagged union: either the grant
//! payload or an error envelope `{errcode, errmsg}`. The discriminator is
//! the success-only field (`access_token` / `ticket`) being present and
//! well-formed; a nonzero `errcode` signals refusal. One parse function
//! per endpoint, no exception-driven type probing.

use serde::{Deserialize, Serialize};

/// Error envelope reported by the provider. `errcode != 0` means failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderError {
    pub errcode: i64,
    pub errmsg: String,
}

/// Successful client-credential exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

/// Successful JS-API ticket exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketGrant {
    pub ticket: String,
    pub expires_in: u64,
}

/// Outcome of one upstream exchange.
#[derive(Debug, Clone)]
pub enum UpstreamReply<T> {
    Granted(T),
    Refused(ProviderError),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("provider response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider response matches neither the grant nor the error shape")]
    Shape,
}

#[derive(Debug, Deserialize)]
struct RawTokenReply {
    access_token: Option<String>,
    expires_in: Option<u64>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTicketReply {
    ticket: Option<String>,
    expires_in: Option<u64>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

pub fn parse_access_token(body: &str) -> Result<UpstreamReply<AccessTokenGrant>, DecodeError> {
    let raw: RawTokenReply = serde_json::from_str(body)?;

    match raw {
        RawTokenReply { access_token: Some(access_token), expires_in: Some(expires_in), .. }
            if !access_token.is_empty() =>
        {
            Ok(UpstreamReply::Granted(AccessTokenGrant { access_token, expires_in }))
        }
        RawTokenReply { errcode: Some(errcode), errmsg, .. } => {
            Ok(UpstreamReply::Refused(ProviderError { errcode, errmsg: errmsg.unwrap_or_default() }))
        }
        _ => Err(DecodeError::Shape),
    }
}

/// The documented ticket endpoint always carries `errcode`/`errmsg`;
/// success is `errcode == 0` with the ticket present.
pub fn parse_js_ticket(body: &str) -> Result<UpstreamReply<TicketGrant>, DecodeError> {
    let raw: RawTicketReply = serde_json::from_str(body)?;

    match raw {
        RawTicketReply { ticket: Some(ticket), expires_in, errcode, .. }
            if errcode.unwrap_or(0) == 0 && !ticket.is_empty() =>
        {
            Ok(UpstreamReply::Granted(TicketGrant { ticket, expires_in: expires_in.unwrap_or(0) }))
        }
        RawTicketReply { errcode: Some(errcode), errmsg, .. } if errcode != 0 => {
            Ok(UpstreamReply::Refused(ProviderError { errcode, errmsg: errmsg.unwrap_or_default() }))
        }
        _ => Err(DecodeError::Shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_grant_is_parsed() {
        let body = r#"{"access_token":"tok-abc","expires_in":7200}"#;
        match parse_access_token(body).unwrap() {
            UpstreamReply::Granted(grant) => {
                assert_eq!(grant.access_token, "tok-abc");
                assert_eq!(grant.expires_in, 7200);
            }
            other => panic!("expected grant, got {:?}", other),
        }
    }

    #[test]
    fn token_error_envelope_is_parsed() {
        let body = r#"{"errcode":40013,"errmsg":"invalid appid"}"#;
        match parse_access_token(body).unwrap() {
            UpstreamReply::Refused(e) => {
                assert_eq!(e.errcode, 40013);
                assert_eq!(e.errmsg, "invalid appid");
            }
            other => panic!("expected refusal, got {:?}", other),
        }
    }

    #[test]
    fn token_reply_matching_neither_shape_is_a_decode_error() {
        assert!(matches!(parse_access_token(r#"{"foo":"bar"}"#), Err(DecodeError::Shape)));
        assert!(matches!(parse_access_token("{not json"), Err(DecodeError::Json(_))));
        // token present but expires_in missing is not a well-formed grant
        assert!(matches!(parse_access_token(r#"{"access_token":"t"}"#), Err(DecodeError::Shape)));
    }

    #[test]
    fn ticket_grant_requires_zero_errcode() {
        let body = r#"{"errcode":0,"errmsg":"ok","ticket":"tkt-1","expires_in":7200}"#;
        match parse_js_ticket(body).unwrap() {
            UpstreamReply::Granted(grant) => assert_eq!(grant.ticket, "tkt-1"),
            other => panic!("expected grant, got {:?}", other),
        }
    }

    #[test]
    fn ticket_error_envelope_is_parsed() {
        let body = r#"{"errcode":42001,"errmsg":"access_token expired"}"#;
        match parse_js_ticket(body).unwrap() {
            UpstreamReply::Refused(e) => assert_eq!(e.errcode, 42001),
            other => panic!("expected refusal, got {:?}", other),
        }
    }

    #[test]
    fn ticket_reply_without_ticket_or_errcode_is_a_decode_error() {
        assert!(matches!(parse_js_ticket(r#"{"errmsg":"ok"}"#), Err(DecodeError::Shape)));
    }
}
