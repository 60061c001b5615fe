use clap::{Parser, ValueEnum};

use crate::utils::constants::{DEFAULT_API_BASE, DEFAULT_EXPIRE_SECS, DEFAULT_HTTP_TIMEOUT_MS};

/// ================================
/// Global service-wide settings
/// ================================
///
/// Every field is environment-sourced; command-line flags override.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// WeChat application id used for the client-credential exchange
    #[arg(long, env = "WECHAT_APPID")]
    pub wechat_appid: String,

    /// WeChat application secret
    #[arg(long, env = "WECHAT_SECRET", hide_env_values = true)]
    pub wechat_secret: String,

    /// Shared secret internal callers must present on the token endpoints
    #[arg(long, env = "SERVER_SECRET", hide_env_values = true)]
    pub server_secret: String,

    /// Upstream API base URL; point at a private gateway or a test stub
    #[arg(long, env = "WECHAT_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Cache TTL seconds for both credentials.
    /// This is the proxy's own refresh cadence, deliberately decoupled
    /// from the provider-declared expires_in.
    #[arg(long, env = "EXPIRE_SECS", default_value_t = DEFAULT_EXPIRE_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub expire_secs: u64,

    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub server_host: String,

    #[arg(long, env = "SERVER_PORT", default_value_t = 8866)]
    pub server_port: u16,

    /// Domains allowed to request JS-SDK signatures (comma separated)
    #[arg(long, env = "DOMAIN_WHITELIST", value_delimiter = ',', default_value = "localhost")]
    pub domain_whitelist: Vec<String>,

    /// Bounded timeout applied to every upstream call
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = DEFAULT_HTTP_TIMEOUT_MS)]
    pub upstream_timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    #[arg(long, env = "METRICS_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub metrics_enabled: bool,

    #[arg(long, env = "METRICS_PATH", default_value = "/metrics")]
    pub metrics_path: String,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}
