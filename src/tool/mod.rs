// src/tool/mod.rs
//! Remote tool invocation: the abstract capability plus its HTTP and scripted
//! implementations.

pub mod http;
pub mod mock;
pub mod types;

pub use http::HttpToolClient;
pub use mock::ScriptedToolClient;
pub use types::{ContentFragment, ToolArgs, ToolError, ToolResponse};

/// Campaign calendar. The misspelling is the upstream tool name.
pub const CAMPAIGN_CALENDAR: &str = "campaign-calender";
pub const AVAILABLE_COUPONS: &str = "available-coupons";
pub const MY_COUPONS: &str = "my-coupons";
/// Claims every claimable coupon for the account; answers with a text summary.
pub const AUTO_BIND_COUPONS: &str = "auto-bind-coupons";

#[async_trait::async_trait]
pub trait ToolClient: Send + Sync {
    async fn invoke(&self, tool: &str, args: &ToolArgs) -> Result<ToolResponse, ToolError>;
    fn name(&self) -> &'static str;
}

/// One-shot claim of all coupons. The summary text is returned as-is, uncached.
pub async fn auto_bind_coupons(client: &dyn ToolClient) -> Result<String, ToolError> {
    let resp = client.invoke(AUTO_BIND_COUPONS, &ToolArgs::new()).await?;
    let text = resp.joined_text();
    tracing::info!(target: "tool", provider = client.name(), bytes = text.len(), "auto-bind finished");
    Ok(text)
}
