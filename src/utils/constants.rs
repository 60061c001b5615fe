//! Shared constants and invariants

/// Cache key holding the base access token.
pub const ACCESS_TOKEN_CACHE_KEY: &str = "data::access_token";
/// Cache key holding the derived JS-API ticket.
pub const JS_TICKET_CACHE_KEY: &str = "data::js_ticket";

// Upstream endpoint paths, relative to the configured API base
pub const TOKEN_ENDPOINT_PATH: &str = "/cgi-bin/token";
pub const TICKET_ENDPOINT_PATH: &str = "/cgi-bin/ticket/getticket";

pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";
pub const DEFAULT_EXPIRE_SECS: u64 = 3600;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
