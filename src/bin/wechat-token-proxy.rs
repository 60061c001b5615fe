use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use wechat_token_proxy::cache::CacheStore;
use wechat_token_proxy::config::settings::Settings;
use wechat_token_proxy::observability::service_resources_metrics::collect_process_metrics;
use wechat_token_proxy::server;
use wechat_token_proxy::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read settings from env/args
    // -------------------------------

    let settings = Arc::new(Settings::parse());
    logging::init(&settings);

    // -------------------------------
    // 2. Create the shared cache store
    // -------------------------------

    let cache = CacheStore::new();

    // -------------------------------
    // 3. Serve until shutdown, alongside the resource metrics collector
    // -------------------------------

    let http_server = server::server::start(settings.clone(), cache);
    let service_metrics = collect_process_metrics(settings.metrics_enabled);

    info!("Service starting...");
    tokio::select! {
        res = http_server => res?,
        res = service_metrics => res?,
    }

    Ok(())
}
