// src/extract/claimed.rs
use once_cell::sync::Lazy;
use regex::Regex;

use super::pipeline::{self, Boundary, FieldSpec};
use super::types::{Coupon, CLAIMED_STATUS};

static RE_SUBHEADING: Lazy<Regex> = Lazy::new(|| Regex::new("## ").expect("sub-heading regex"));

const LISTING_PHRASE: &str = "优惠券列表";

const LINE_VALUE: &[Boundary<'static>] = &[Boundary::Escape, Boundary::LineEnd];

const PRICE: FieldSpec<'static> = FieldSpec {
    labels: &["**优惠**: ", "**优惠**："],
    until: LINE_VALUE,
    multiline: false,
};

const VALIDITY: FieldSpec<'static> = FieldSpec {
    labels: &["**有效期**: ", "**有效期**："],
    until: LINE_VALUE,
    multiline: false,
};

const TAGS: FieldSpec<'static> = FieldSpec {
    labels: &["**标签**: ", "**标签**："],
    until: LINE_VALUE,
    multiline: false,
};

const DESCRIPTION: FieldSpec<'static> = FieldSpec {
    labels: &["**描述**: ", "**描述**："],
    until: LINE_VALUE,
    multiline: false,
};

/// My-coupons text → one coupon per `## ` section with a title.
pub fn parse_claimed_coupons(text: &str) -> Vec<Coupon> {
    let mut out = Vec::new();
    for segment in pipeline::split_segments(text, &RE_SUBHEADING) {
        let first = pipeline::first_line(segment);
        if pipeline::is_listing_header(first, LISTING_PHRASE) {
            continue;
        }

        let title = first.trim_start_matches('#').trim();
        if title.is_empty() {
            continue;
        }

        out.push(Coupon {
            title: title.to_string(),
            status: CLAIMED_STATUS.to_string(),
            image: pipeline::first_image(segment),
            description: pipeline::field_value(segment, &DESCRIPTION),
            price: pipeline::field_value(segment, &PRICE),
            validity: pipeline::field_value(segment, &VALIDITY),
            tags: pipeline::field_value(segment, &TAGS)
                .map(|raw| pipeline::split_tags(&raw))
                .unwrap_or_default(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_title_is_skipped() {
        let text = "# 我的优惠券列表\n\n## 麦辣鸡腿堡\n**优惠**: 立减5元\n";
        let coupons = parse_claimed_coupons(text);
        assert_eq!(coupons.len(), 1);
        assert_eq!(coupons[0].title, "麦辣鸡腿堡");
        assert_eq!(coupons[0].price.as_deref(), Some("立减5元"));
        assert_eq!(coupons[0].status, CLAIMED_STATUS);
    }

    #[test]
    fn field_on_last_line_without_break_is_absent() {
        let text = "## 可乐\n**有效期**: 2025-12-31";
        let coupons = parse_claimed_coupons(text);
        assert_eq!(coupons[0].validity, None);
    }

    #[test]
    fn tags_split_on_comma_and_ideographic_comma() {
        let text = "## 早餐套餐\n**标签**: A,B、C\n";
        assert_eq!(parse_claimed_coupons(text)[0].tags, vec!["A", "B", "C"]);
    }
}
