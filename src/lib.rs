// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod extract;
pub mod metrics;
pub mod orchestrator;
pub mod tool;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::{cache_key, CacheEntry, MemoryStorage, SessionStorage, ToolCache};
pub use crate::config::ClientConfig;
pub use crate::extract::{
    parse_available_coupons, parse_calendar_text, parse_claimed_coupons, CampaignEvent, Coupon,
};
pub use crate::orchestrator::{DataBinding, FetchState, Orchestrator, Phase, FRESHNESS_WINDOW};
pub use crate::tool::{HttpToolClient, ToolArgs, ToolClient, ToolError, ToolResponse};

use std::sync::Arc;
use std::time::Duration;

/// Wire an orchestrator from config: HTTP tool client, in-memory session cache,
/// configured freshness window.
pub fn orchestrator_from_config(cfg: &ClientConfig) -> anyhow::Result<Orchestrator> {
    let client = HttpToolClient::from_config(cfg)?;
    if !cfg.has_credential() {
        tracing::warn!("no MCP token configured; tool calls will fail until one is set");
    }
    Ok(
        Orchestrator::new(Arc::new(client), ToolCache::in_memory())
            .with_freshness(Duration::from_secs(cfg.freshness_secs)),
    )
}
