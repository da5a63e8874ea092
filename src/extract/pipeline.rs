// src/extract/pipeline.rs
//! Segment-then-extract stages shared by every extractor.
//!
//! 1. [`split_segments`] cuts raw text on a source-specific delimiter.
//! 2. [`is_listing_header`] flags segments that are section titles, not records.
//! 3. [`capture_field`] takes the run after a label up to the nearest [`Boundary`].
//! 4. [`normalize_value`] turns escaped `\n` into line breaks and trims.
//! 5. [`first_image`] picks the first `src="..."` attribute.
//!
//! Record validation is left to each extractor.

use once_cell::sync::Lazy;
use regex::Regex;

/// Where a captured field value stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary<'a> {
    /// A literal backslash, i.e. the start of an escaped `\n` in the upstream text.
    Escape,
    /// A real line break.
    LineEnd,
    /// A literal marker such as an `<img` tag.
    Marker(&'a str),
    /// The next bold label, `**name**：` or `**name**:`. Inline bold text is not a label.
    NextLabel,
    /// The end of the segment. Only fields that opt in may run to the end.
    SegmentEnd,
}

/// How to locate and bound one labeled field inside a segment.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    /// Accepted label spellings; the earliest occurrence wins.
    pub labels: &'a [&'a str],
    pub until: &'a [Boundary<'a>],
    /// Single-line fields never look past the line the label sits on.
    pub multiline: bool,
}

/// Split `text` on `delimiter`, dropping segments that are blank after trimming.
pub fn split_segments<'a>(text: &'a str, delimiter: &Regex) -> Vec<&'a str> {
    delimiter
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// First line of a segment, trimmed.
pub fn first_line(segment: &str) -> &str {
    segment.lines().next().unwrap_or_default().trim()
}

/// Everything after the first line (empty when the segment is one line).
pub fn body(segment: &str) -> &str {
    segment.split_once('\n').map(|(_, rest)| rest).unwrap_or_default()
}

/// A segment whose first line is itself a heading, or names the listing, is not a record.
pub fn is_listing_header(first_line: &str, listing_phrase: &str) -> bool {
    first_line.starts_with('#') || first_line.contains(listing_phrase)
}

static RE_BOLD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*[^*\n]+\*\*[：:]").expect("bold label regex"));

/// Raw text of a labeled field, or `None` when the label is missing or no
/// boundary closes the value. Never captures past the last boundary it can see.
pub fn capture_field<'h>(haystack: &'h str, spec: &FieldSpec<'_>) -> Option<&'h str> {
    let (start, label_len) = spec
        .labels
        .iter()
        .filter_map(|label| haystack.find(label).map(|pos| (pos, label.len())))
        .min_by_key(|(pos, _)| *pos)?;
    let rest = &haystack[start + label_len..];

    // `window_is_line`: the window was cut at a real newline.
    let (window, window_is_line) = match (spec.multiline, rest.find('\n')) {
        (false, Some(nl)) => (&rest[..nl], true),
        _ => (rest, false),
    };

    let end = spec
        .until
        .iter()
        .filter_map(|b| match b {
            Boundary::Escape => window.find('\\'),
            Boundary::LineEnd if window_is_line => Some(window.len()),
            Boundary::LineEnd => window.find('\n'),
            Boundary::Marker(m) => window.find(m),
            Boundary::NextLabel => RE_BOLD_LABEL.find(window).map(|m| m.start()),
            Boundary::SegmentEnd => (!window_is_line).then_some(window.len()),
        })
        .min()?;

    Some(&window[..end])
}

/// Escaped newlines become line breaks; surrounding whitespace goes.
pub fn normalize_value(raw: &str) -> String {
    raw.replace("\\n", "\n").trim().to_string()
}

/// [`capture_field`] + [`normalize_value`], treating an empty result as absent.
pub fn field_value(haystack: &str, spec: &FieldSpec<'_>) -> Option<String> {
    capture_field(haystack, spec)
        .map(normalize_value)
        .filter(|v| !v.is_empty())
}

static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="([^"]+)""#).expect("img src regex"));

/// First `src="..."` in the segment, with HTML entities (`&amp;`) decoded.
pub fn first_image(segment: &str) -> Option<String> {
    RE_IMG_SRC
        .captures(segment)
        .map(|c| html_escape::decode_html_entities(&c[1]).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split a tag list on ASCII comma, fullwidth comma or ideographic comma.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([',', '，', '、'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
