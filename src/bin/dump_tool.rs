//! Invoke one tool once and print what the extractors make of it.
//!
//! Usage: `dump_tool <campaign-calender|available-coupons|my-coupons|auto-bind-coupons> [--raw]`

use anyhow::{bail, Context};
use coupon_feed::{extract, tool, ClientConfig, HttpToolClient, ToolArgs, ToolClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let Some(name) = args.next() else {
        bail!("usage: dump_tool <tool-name> [--raw]");
    };
    let show_raw = args.any(|a| a == "--raw");

    let cfg = ClientConfig::load_default().context("loading client config")?;
    let client = HttpToolClient::from_config(&cfg)?;
    tracing::info!(endpoint = client.endpoint(), tool = %name, "invoking");
    let resp = client.invoke(&name, &ToolArgs::new()).await?;
    let text = resp.joined_text();

    if show_raw {
        println!("{text}\n----");
    }

    let out = match name.as_str() {
        tool::CAMPAIGN_CALENDAR => serde_json::to_string_pretty(&extract::parse_calendar_text(&text))?,
        tool::AVAILABLE_COUPONS => {
            serde_json::to_string_pretty(&extract::parse_available_coupons(&text))?
        }
        tool::MY_COUPONS => serde_json::to_string_pretty(&extract::parse_claimed_coupons(&text))?,
        _ => text,
    };
    println!("{out}");
    Ok(())
}
