pub mod response;

pub use response::{
    parse_access_token, parse_js_ticket, AccessTokenGrant, DecodeError, ProviderError,
    TicketGrant, UpstreamReply,
};
