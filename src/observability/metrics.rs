use prometheus::{
    Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Upstream fetch metrics, labeled by credential (access_token / js_ticket)
    pub upstream_fetch_requests: IntCounterVec,
    pub upstream_fetch_failures: IntCounterVec,
    pub upstream_fetch_duration: HistogramVec,

    // Cache metrics
    pub cache_hits: IntCounterVec,
    pub cache_misses: IntCounterVec,

    // Signing metrics
    pub signature_requests: IntCounter,
    pub signature_rejections: IntCounterVec,

    // Runtime
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("wechat_proxy".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            upstream_fetch_requests: IntCounterVec::new(Opts::new("upstream_fetch_requests_total", "Upstream fetch attempts by credential"), &["credential"]).unwrap(),
            upstream_fetch_failures: IntCounterVec::new(Opts::new("upstream_fetch_failures_total", "Upstream fetch failures by reason"), &["credential", "reason"]).unwrap(),
            upstream_fetch_duration: HistogramVec::new(HistogramOpts::new("upstream_fetch_duration_seconds", "Upstream fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["credential"]).unwrap(),

            cache_hits: IntCounterVec::new(Opts::new("cache_hits_total", "Cache-aside hits by credential"), &["credential"]).unwrap(),
            cache_misses: IntCounterVec::new(Opts::new("cache_misses_total", "Cache-aside misses by credential"), &["credential"]).unwrap(),

            signature_requests: IntCounter::new("signature_requests_total", "JS-SDK signature requests").unwrap(),
            signature_rejections: IntCounterVec::new(Opts::new("signature_rejections_total", "Rejected signature requests by reason"), &["reason"]).unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").unwrap(),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").unwrap(),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").unwrap(),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").unwrap(),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.upstream_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.signature_requests.clone())).unwrap();
        reg.register(Box::new(metrics.signature_rejections.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        reg.register(Box::new(metrics.process_cpu_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_memory_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_open_fds.clone())).unwrap();
        reg.register(Box::new(metrics.process_start_time.clone())).unwrap();
        reg.register(Box::new(metrics.process_uptime.clone())).unwrap();

        metrics
    }
}
