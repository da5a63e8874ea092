//! Cache contract of the fetch/cache orchestrator, driven by a scripted tool
//! client and a manual clock.
//!
//! Covered:
//! - MISS → HIT within the freshness window (call-count assertion)
//! - expiry after the window triggers exactly one new call
//! - forced refresh bypasses a fresh entry
//! - failed refresh keeps data and cache, only sets the error
//! - first-ever failure: no data, error set
//! - malformed stored entry is treated as absent

use std::sync::Arc;
use std::time::Duration;

use coupon_feed::cache::{cache_key, CacheEntry, MemoryStorage, SessionStorage, ToolCache};
use coupon_feed::clock::ManualClock;
use coupon_feed::tool::{ContentFragment, ScriptedToolClient, ToolArgs, ToolError, ToolResponse};
use coupon_feed::{parse_calendar_text, CampaignEvent, Orchestrator, Phase, FRESHNESS_WINDOW};

const T0: i64 = 1_733_616_000_000;

const DAY_ONE: &str = "#### 12月8日 往期回顾\n**活动标题**：圣诞特惠\\n**活动内容介绍**：全场八折\\n";
const DAY_TWO: &str = "#### 12月9日 今日\n**活动标题**：新品上市\\n";

struct Harness {
    client: Arc<ScriptedToolClient>,
    clock: Arc<ManualClock>,
    storage: Arc<MemoryStorage>,
    orch: Orchestrator,
}

fn harness() -> Harness {
    let client = Arc::new(ScriptedToolClient::new());
    let clock = Arc::new(ManualClock::at(T0));
    let storage = Arc::new(MemoryStorage::new());
    let orch = Orchestrator::new(client.clone(), ToolCache::new(storage.clone()))
        .with_clock(clock.clone());
    Harness {
        client,
        clock,
        storage,
        orch,
    }
}

fn titles(events: &Option<Vec<CampaignEvent>>) -> Vec<String> {
    events
        .as_ref()
        .map(|v| v.iter().map(|e| e.title.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn second_request_within_window_is_served_from_cache() {
    let h = harness();
    h.client.push_text(DAY_ONE);
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    let first = b.request(false).await;
    assert_eq!(first.phase(), Phase::Ready);
    assert_eq!(h.client.call_count(), 1);

    h.clock.advance(Duration::from_secs(299));
    let second = b.request(false).await;
    assert_eq!(h.client.call_count(), 1, "fresh entry must not invoke the tool");
    assert_eq!(second.data, first.data);
    assert_eq!(second.raw_text.as_deref(), Some(DAY_ONE));
    assert!(!second.loading);
}

#[tokio::test]
async fn expired_entry_triggers_exactly_one_new_call() {
    let h = harness();
    h.client.push_text(DAY_ONE);
    h.client.push_text(DAY_TWO);
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    b.request(false).await;
    h.clock.advance(FRESHNESS_WINDOW);

    let st = b.request(false).await;
    assert_eq!(h.client.call_count(), 2);
    assert_eq!(titles(&st.data), vec!["新品上市"]);

    // The refreshed entry is fresh again.
    let st = b.request(false).await;
    assert_eq!(h.client.call_count(), 2);
    assert_eq!(titles(&st.data), vec!["新品上市"]);
}

#[tokio::test]
async fn forced_refresh_bypasses_fresh_entry() {
    let h = harness();
    h.client.push_text(DAY_ONE);
    h.client.push_text(DAY_TWO);
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    b.request(false).await;
    let st = b.refresh().await;
    assert_eq!(h.client.call_count(), 2);
    assert_eq!(titles(&st.data), vec!["新品上市"]);

    let key = cache_key("campaign-calender", &ToolArgs::new());
    let cached: CacheEntry<Vec<CampaignEvent>> = h.orch.cache().get(&key).expect("entry");
    assert_eq!(cached.raw_text, DAY_TWO);
    assert_eq!(cached.timestamp, T0);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_data_and_cache() {
    let h = harness();
    h.client.push_text(DAY_ONE);
    h.client
        .push(Err(ToolError::Transport("connection reset".into())));
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    b.request(false).await;
    let key = cache_key("campaign-calender", &ToolArgs::new());
    let before = h.storage.get_item(&key);

    let st = b.refresh().await;
    assert_eq!(st.phase(), Phase::Error);
    assert!(!st.loading);
    assert_eq!(titles(&st.data), vec!["圣诞特惠"], "stale data stays visible");
    assert_eq!(st.raw_text.as_deref(), Some(DAY_ONE));
    assert_eq!(
        st.error,
        Some(ToolError::Transport("connection reset".into()))
    );
    assert_eq!(h.storage.get_item(&key), before, "cache untouched on failure");
}

#[tokio::test]
async fn next_success_clears_error() {
    let h = harness();
    h.client.push(Err(ToolError::Protocol {
        code: -32603,
        message: "internal".into(),
    }));
    h.client.push_text(DAY_TWO);
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    let st = b.request(false).await;
    assert_eq!(st.phase(), Phase::Error);
    assert_eq!(st.data, None, "first failure has nothing to show");
    assert!(h.storage.is_empty());

    let st = b.refresh().await;
    assert_eq!(st.phase(), Phase::Ready);
    assert_eq!(st.error, None);
}

#[tokio::test]
async fn malformed_cache_entry_is_refetched() {
    let h = harness();
    let key = cache_key("campaign-calender", &ToolArgs::new());
    h.storage.set_item(&key, "{\"data\": 12".into());
    h.client.push_text(DAY_ONE);
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    let st = b.request(false).await;
    assert_eq!(h.client.call_count(), 1);
    assert_eq!(titles(&st.data), vec!["圣诞特惠"]);
    assert!(h.orch.cache().get::<Vec<CampaignEvent>>(&key).is_some());
}

#[tokio::test]
async fn text_fragments_are_joined_with_line_breaks() {
    let h = harness();
    h.client.push(Ok(ToolResponse {
        content: vec![
            ContentFragment::text("#### 12月8日"),
            ContentFragment {
                kind: "resource".into(),
                text: None,
            },
            ContentFragment::text("**活动标题**：分段\\n"),
        ],
        is_error: false,
    }));
    let b = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);

    let st = b.request(false).await;
    assert_eq!(
        st.raw_text.as_deref(),
        Some("#### 12月8日\n**活动标题**：分段\\n")
    );
    assert_eq!(titles(&st.data), vec!["分段"]);
}

#[tokio::test]
async fn bindings_with_different_args_do_not_share_entries() {
    let h = harness();
    h.client.push_text(DAY_ONE);
    h.client.push_text(DAY_TWO);

    let mut args = ToolArgs::new();
    args.insert("store".into(), serde_json::json!("1001"));
    let plain = h.orch.bind("campaign-calender", ToolArgs::new(), parse_calendar_text);
    let scoped = h.orch.bind("campaign-calender", args.clone(), parse_calendar_text);

    plain.request(false).await;
    let st = scoped.request(false).await;
    assert_eq!(h.client.call_count(), 2);
    assert_eq!(titles(&st.data), vec!["新品上市"]);
    assert_eq!(h.client.calls()[1].1, args);
    assert_eq!(h.storage.len(), 2);
}
