use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use reqwest::Client;
use tracing::info;

use crate::cache::CacheStore;
use crate::config::settings::Settings;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::routes;
use crate::signing::SignatureEngine;
use crate::sources::{AccessTokenSource, JsTicketSource};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub access_tokens: AccessTokenSource,
    pub tickets: JsTicketSource,
    pub signer: SignatureEngine,
    pub metrics_state: MetricsState,
}

impl AppState {
    /// Wires the pipeline: one shared cache, one HTTP client with a
    /// bounded timeout, and the fetcher chain composed explicitly
    /// (ticket fetcher over token fetcher, signer over ticket fetcher).
    pub async fn new(settings: Arc<Settings>, cache: CacheStore) -> Result<Self> {
        let metrics = get_metrics().await;
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.upstream_timeout_ms))
            .build()?;

        let access_tokens = AccessTokenSource::new(cache.clone(), client.clone(), &settings);
        let tickets = JsTicketSource::new(cache, client, access_tokens.clone(), &settings);
        let signer = SignatureEngine::new(tickets.clone(), settings.domain_whitelist.clone());

        Ok(Self {
            settings,
            access_tokens,
            tickets,
            signer,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::router())
            .merge(
                self.metrics_state
                    .router(self.settings.metrics_enabled, &self.settings.metrics_path),
            )
            .with_state(self.clone())
    }
}

/// Start one Axum server exposing the three proxy operations.
pub async fn start(settings: Arc<Settings>, cache: CacheStore) -> Result<()> {
    let state = AppState::new(settings.clone(), cache).await?;
    let app = state.router();

    let bind_addr = settings.bind_addr();
    info!("listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    get_metrics().await.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
