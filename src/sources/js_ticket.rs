use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::settings::Settings;
use crate::observability::metrics::get_metrics;
use crate::parser::{parse_js_ticket, UpstreamReply};
use crate::sources::{AccessTokenSource, FetchError};
use crate::utils::constants::{JS_TICKET_CACHE_KEY, TICKET_ENDPOINT_PATH};

static CREDENTIAL: &str = "js_ticket";

/// Cache-aside fetcher for the JS-API ticket.
///
/// Strict sequential dependent of [`AccessTokenSource`]: the base token is
/// obtained through its `fetch()` only, so this fetcher inherits that
/// cache-aside logic instead of re-implementing it. Once cached, the
/// ticket no longer depends on the token it was derived from.
#[derive(Debug, Clone)]
pub struct JsTicketSource {
    cache: CacheStore,
    client: Client,
    api_base: String,
    access_tokens: AccessTokenSource,
    cache_ttl_seconds: u64,
}

impl JsTicketSource {
    pub fn new(
        cache: CacheStore,
        client: Client,
        access_tokens: AccessTokenSource,
        settings: &Settings,
    ) -> Self {
        Self {
            cache,
            client,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            access_tokens,
            cache_ttl_seconds: settings.expire_secs,
        }
    }

    pub async fn fetch(&self) -> Result<String, FetchError> {
        let metrics = get_metrics().await;

        // -------------------------------
        // 1. Cache read
        // -------------------------------

        if let Some(cached) = self.cache.get(JS_TICKET_CACHE_KEY).await {
            if !cached.is_empty() {
                metrics.cache_hits.with_label_values(&[CREDENTIAL]).inc();
                debug!(credential = CREDENTIAL, "serving cached credential");
                return Ok(cached);
            }
        }
        metrics.cache_misses.with_label_values(&[CREDENTIAL]).inc();

        // -------------------------------
        // 2. Base token first; its failure short-circuits the chain
        // -------------------------------

        let access_token = self.access_tokens.fetch().await?;

        // -------------------------------
        // 3. Single ticket exchange
        // -------------------------------

        let start = Instant::now();
        metrics.upstream_fetch_requests.with_label_values(&[CREDENTIAL]).inc();

        let result = self.exchange(&access_token).await;

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

    async fn exchange(&self, access_token: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.api_base, TICKET_ENDPOINT_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[("access_token", access_token), ("type", "jsapi")])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        match parse_js_ticket(&body)? {
            UpstreamReply::Granted(grant) => {
                self.cache
                    .set(JS_TICKET_CACHE_KEY, &grant.ticket, self.cache_ttl_seconds)
                    .await;
                info!(
                    credential = CREDENTIAL,
                    provider_expires_in = grant.expires_in,
                    cache_ttl = self.cache_ttl_seconds,
                    "credential refreshed"
                );
                Ok(grant.ticket)
            }
            UpstreamReply::Refused(e) => {
                warn!(credential = CREDENTIAL, errcode = e.errcode, errmsg = %e.errmsg, "provider refused exchange");
                Err(FetchError::Provider(e))
            }
        }
    }
}
