use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::settings::Settings;
use crate::observability::metrics::get_metrics;
use crate::parser::{parse_access_token, UpstreamReply};
use crate::sources::FetchError;
use crate::utils::constants::{ACCESS_TOKEN_CACHE_KEY, TOKEN_ENDPOINT_PATH};

static CREDENTIAL: &str = "access_token";

/// Cache-aside fetcher for the base access token.
#[derive(Debug, Clone)]
pub struct AccessTokenSource {
    cache: CacheStore,
    client: Client,
    api_base: String,
    appid: String,
    secret: String,
    cache_ttl_seconds: u64,
}

impl AccessTokenSource {
    pub fn new(cache: CacheStore, client: Client, settings: &Settings) -> Self {
        Self {
            cache,
            client,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            appid: settings.wechat_appid.clone(),
            secret: settings.wechat_secret.clone(),
            cache_ttl_seconds: settings.expire_secs,
        }
    }

    /// Returns a usable access token, reading the cache first and going
    /// upstream only on a miss. A cached value was validated at write
    /// time, so reads never re-validate. No retry: one upstream failure
    /// fails this call, and nothing is cached for it.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let metrics = get_metrics().await;

        // -------------------------------
        // 1. Cache read
        // -------------------------------

        if let Some(cached) = self.cache.get(ACCESS_TOKEN_CACHE_KEY).await {
            if !cached.is_empty() {
                metrics.cache_hits.with_label_values(&[CREDENTIAL]).inc();
                debug!(credential = CREDENTIAL, "serving cached credential");
                return Ok(cached);
            }
        }
        metrics.cache_misses.with_label_values(&[CREDENTIAL]).inc();

        // -------------------------------
        // 2. Single upstream exchange on miss
        // -------------------------------

        let start = Instant::now();
        metrics.upstream_fetch_requests.with_label_values(&[CREDENTIAL]).inc();

        let result = self.exchange().await;

        metrics
            .upstream_fetch_duration
            .with_label_values(&[CREDENTIAL])
            .observe(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics
                .upstream_fetch_failures
                .with_label_values(&[CREDENTIAL, e.reason()])
                .inc();
        }
        result
    }

    async fn exchange(&self) -> Result<String, FetchError> {
        let url = format!("{}{}", self.api_base, TOKEN_ENDPOINT_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.appid.as_str()),
                ("secret", self.secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        match parse_access_token(&body)? {
            UpstreamReply::Granted(grant) => {
                // cache with the configured TTL, not the provider's
                // expires_in: the proxy refreshes on its own cadence
                self.cache
                    .set(ACCESS_TOKEN_CACHE_KEY, &grant.access_token, self.cache_ttl_seconds)
                    .await;
                info!(
                    credential = CREDENTIAL,
                    provider_expires_in = grant.expires_in,
                    cache_ttl = self.cache_ttl_seconds,
                    "credential refreshed"
                );
                Ok(grant.access_token)
            }
            UpstreamReply::Refused(e) => {
                warn!(credential = CREDENTIAL, errcode = e.errcode, errmsg = %e.errmsg, "provider refused exchange");
                Err(FetchError::Provider(e))
            }
        }
    }
}
