// src/extract/calendar.rs
use once_cell::sync::Lazy;
use regex::Regex;

use super::pipeline::{self, Boundary, FieldSpec};
use super::types::CampaignEvent;

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new("####").expect("heading regex"));

// "12月8日 往期回顾" / "12月9日 今日"
static RE_DATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+月\d+日)\s*(.*)$").expect("date line regex"));

const TITLE: FieldSpec<'static> = FieldSpec {
    labels: &["**活动标题**：", "**活动标题**:"],
    until: &[Boundary::Escape, Boundary::LineEnd],
    multiline: false,
};

const DESCRIPTION: FieldSpec<'static> = FieldSpec {
    labels: &["**活动内容介绍**：", "**活动内容介绍**:"],
    until: &[
        Boundary::NextLabel,
        Boundary::Marker("<img"),
        Boundary::SegmentEnd,
    ],
    multiline: true,
};

/// Split a heading line into `(date, status)`. A line that does not start with
/// a `<N>月<N>日` date is kept verbatim as the date.
fn parse_heading(line: &str) -> (String, Option<String>) {
    match RE_DATE_LINE.captures(line) {
        Some(c) => {
            let status = c[2].trim();
            let status = (!status.is_empty()).then(|| status.to_string());
            (c[1].to_string(), status)
        }
        None => (line.to_string(), None),
    }
}

/// Campaign calendar text → one event per `####` section that has a title.
pub fn parse_calendar_text(text: &str) -> Vec<CampaignEvent> {
    let mut out = Vec::new();
    for segment in pipeline::split_segments(text, &RE_HEADING) {
        let (date, status) = parse_heading(pipeline::first_line(segment));
        let body = pipeline::body(segment);

        let Some(title) = pipeline::field_value(body, &TITLE) else {
            tracing::trace!(target: "extract", %date, "calendar segment without title dropped");
            continue;
        };

        out.push(CampaignEvent {
            date,
            status,
            title,
            description: pipeline::field_value(body, &DESCRIPTION).unwrap_or_default(),
            image: pipeline::first_image(body),
        });
    }
    out
}
