// tests/common/mod.rs
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use httpmock::prelude::*;
use httpmock::Mock;
use reqwest::Client;
use serde_json::json;
use tokio::task::JoinHandle;

use crate::cache::CacheStore;
use crate::config::settings::{LogFormat, Settings};
use crate::server::server::AppState;

pub const TEST_APPID: &str = "appid-test";
pub const TEST_APP_SECRET: &str = "app-secret-test";
pub const TEST_SERVER_SECRET: &str = "server-secret";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Settings pointed at a mock provider; TTL and allow-list tuned per test.
pub fn test_settings(api_base: &str, expire_secs: u64, whitelist: &[&str]) -> Settings {
    Settings {
        wechat_appid: TEST_APPID.to_string(),
        wechat_secret: TEST_APP_SECRET.to_string(),
        server_secret: TEST_SERVER_SECRET.to_string(),
        api_base: api_base.to_string(),
        expire_secs,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        domain_whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
        upstream_timeout_ms: 2000,
        log_level: None,
        log_format: LogFormat::Compact,
        metrics_enabled: false,
        metrics_path: "/metrics".to_string(),
    }
}

/// Full pipeline state over a fresh cache, for driving fetchers or the
/// router directly.
pub async fn test_state(settings: Settings) -> (AppState, CacheStore) {
    let cache = CacheStore::new();
    let state = AppState::new(Arc::new(settings), cache.clone()).await.expect("app state");
    (state, cache)
}

/// Token endpoint stub answering with a grant.
pub async fn mock_token_grant<'a>(server: &'a MockServer, token: &str) -> Mock<'a> {
    let token = token.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/cgi-bin/token")
                .query_param("grant_type", "client_credential")
                .query_param("appid", TEST_APPID)
                .query_param("secret", TEST_APP_SECRET);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "access_token": token, "expires_in": 7200 }));
        })
        .await
}

/// Token endpoint stub answering with the provider error envelope.
pub async fn mock_token_refusal<'a>(server: &'a MockServer, errcode: i64, errmsg: &str) -> Mock<'a> {
    let errmsg = errmsg.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/cgi-bin/token");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": errcode, "errmsg": errmsg }));
        })
        .await
}

/// Ticket endpoint stub answering with a grant for the expected token.
pub async fn mock_ticket_grant<'a>(
    server: &'a MockServer,
    expected_access_token: &str,
    ticket: &str,
) -> Mock<'a> {
    let expected_access_token = expected_access_token.to_string();
    let ticket = ticket.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/cgi-bin/ticket/getticket")
                .query_param("access_token", expected_access_token)
                .query_param("type", "jsapi");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": 0, "errmsg": "ok", "ticket": ticket, "expires_in": 7200 }));
        })
        .await
}
