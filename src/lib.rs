//! # WeChat Token Proxy Library
//!
//! Sits between internal callers and the WeChat open-platform API,
//! fetching and caching the short-lived credentials so callers never
//! talk to the upstream provider directly.
//!
//! Modules:
//! - `config` — environment-sourced service settings
//! - `cache` — shared key-value store with per-key expiry
//! - `sources` — access-token and JS-API-ticket fetchers (cache-aside)
//! - `parser` — parsing upstream replies into grant-or-error unions
//! - `signing` — JS-SDK signature engine
//! - `server` — HTTP surface exposing the three operations

pub mod config;
pub mod cache;
pub mod sources;
pub mod parser;
pub mod signing;
pub mod tests;
pub mod observability;
pub mod server;
pub mod helpers;
pub mod utils;


pub use crate::config::settings::Settings;
pub use crate::sources::FetchError;
