use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("tool_cache_hits_total", "Requests served from a fresh cache entry.");
        describe_counter!(
            "tool_cache_misses_total",
            "Unforced requests that found no fresh cache entry."
        );
        describe_counter!("tool_invocations_total", "Remote tool calls issued.");
        describe_counter!("tool_errors_total", "Failed tool calls (any error kind).");
        describe_counter!(
            "tool_stale_discards_total",
            "Completions dropped because a newer request superseded them."
        );
        describe_counter!(
            "tool_http_status_errors_total",
            "Tool calls answered with a non-success HTTP status."
        );
        describe_counter!("extract_runs_total", "Extractor runs over fetched text.");
        describe_histogram!("tool_invoke_ms", "Tool call round trip in milliseconds.");
        describe_gauge!(
            "tool_cache_freshness_ms",
            "Maximum age of a cache entry served without a tool call."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and expose a static gauge for the freshness window.
    pub fn init(freshness_ms: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_described();
        gauge!("tool_cache_freshness_ms").set(freshness_ms as f64);
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
