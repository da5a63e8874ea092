//! coupon-feed binary entrypoint.
//! Loads config, initializes tracing and metrics, and serves the HTTP API.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coupon_feed::{api, metrics::Metrics, orchestrator_from_config, AppState, ClientConfig};

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coupon_feed=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ClientConfig::load_default().context("loading client config")?;
    tracing::info!(
        endpoint = %cfg.endpoint,
        freshness_secs = cfg.freshness_secs,
        key_len = cfg.api_key.len(),
        "client config loaded"
    );

    let metrics = Metrics::init(cfg.freshness_secs * 1_000).context("installing metrics recorder")?;
    let orch = orchestrator_from_config(&cfg)?;
    let app = api::router(AppState::new(orch)).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
