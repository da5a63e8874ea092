// src/extract/mod.rs
//! Text → record extractors for the campaign/coupon tools.
//!
//! Every extractor is a pure, total function: malformed segments are dropped,
//! never reported as errors, and output keeps input order without dedup.

pub mod available;
pub mod calendar;
pub mod claimed;
pub mod pipeline;
pub mod types;

pub use available::parse_available_coupons;
pub use calendar::parse_calendar_text;
pub use claimed::parse_claimed_coupons;
pub use types::{CampaignEvent, Coupon, CLAIMED_STATUS, UNKNOWN_STATUS};
