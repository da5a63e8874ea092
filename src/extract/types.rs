// src/extract/types.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Status assigned when an available-coupon segment carries no status label.
/// Records resolving to this value are dropped, never emitted.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Status given to every coupon listed under the user's own coupons.
pub const CLAIMED_STATUS: &str = "Available";

/// One day on the campaign calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CampaignEvent {
    /// Month+day as written upstream, e.g. "12月8日". No year.
    pub date: String,
    /// Trailing annotation from the heading line, e.g. "往期回顾" or "今日".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

static RE_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})日").expect("month/day regex"));

impl CampaignEvent {
    /// Month and day parsed from `date`, if it has the `<N>月<N>日` shape.
    pub fn month_day(&self) -> Option<(u32, u32)> {
        let caps = RE_MONTH_DAY.captures(&self.date)?;
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        Some((month, day))
    }

    /// Pin the event to a calendar year chosen by the caller.
    /// Returns `None` for unparseable dates or impossible days (e.g. 2月30日).
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        let (month, day) = self.month_day()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// A coupon, either offered (available) or already held (claimed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coupon {
    pub title: String,
    /// Free-text label such as "已领取" / "未领取"; not a closed set.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
