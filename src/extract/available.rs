// src/extract/available.rs
use once_cell::sync::Lazy;
use regex::Regex;

use super::pipeline::{self, Boundary, FieldSpec};
use super::types::{Coupon, UNKNOWN_STATUS};

// "- 优惠券标题：<title> \n状态：<status> \n..."
static RE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\s+优惠券标题[：:]").expect("coupon bullet regex"));

const STATUS: FieldSpec<'static> = FieldSpec {
    labels: &["状态：", "状态:"],
    until: &[Boundary::Escape],
    multiline: false,
};

const LISTING_PHRASE: &str = "列表";

/// Title is the first line up to the escaped newline, or the whole first line.
fn item_title(segment: &str) -> String {
    let line = segment.lines().next().unwrap_or_default();
    let cut = line.split_once('\\').map(|(head, _)| head).unwrap_or(line);
    cut.trim().to_string()
}

/// Available-coupons text → coupons that carry both a title and a status.
pub fn parse_available_coupons(text: &str) -> Vec<Coupon> {
    let mut out = Vec::new();
    for segment in pipeline::split_segments(text, &RE_ITEM) {
        let title = item_title(segment);
        if title.is_empty() || pipeline::is_listing_header(&title, LISTING_PHRASE) {
            continue;
        }

        let status = pipeline::field_value(segment, &STATUS)
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
        if status == UNKNOWN_STATUS {
            tracing::trace!(target: "extract", %title, "available coupon without status dropped");
            continue;
        }

        out.push(Coupon {
            title,
            status,
            image: pipeline::first_image(segment),
            description: None,
            price: None,
            validity: None,
            tags: Vec::new(),
        });
    }
    out
}
