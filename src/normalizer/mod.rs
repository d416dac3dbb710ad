//! Text transforms shared by every adapter when mapping provider payloads
//! into [`CanonicalPost`](crate::domain::CanonicalPost) fields.

use chrono::{DateTime, NaiveDateTime, Utc};
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum excerpt length in characters, before the ellipsis.
pub const EXCERPT_CHARS: usize = 200;

const ELLIPSIS: &str = "...";
const CHARS_PER_MINUTE: usize = 1000;
const WORDS_PER_MINUTE: usize = 200;
// Enough for triple-escaped feeds
const MAX_DECODE_PASSES: usize = 4;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Remove `<...>` markup. Text without tags is returned unchanged.
pub fn strip_tags(text: &str) -> String {
    TAGS.replace_all(text, "").into_owned()
}

/// Plain-text summary of an HTML fragment.
///
/// Entities are decoded before tags are stripped, repeatedly, so escaped
/// markup in a description never survives into the excerpt. Line breaks in
/// the text are kept. Running `excerpt` on its own output returns it
/// unchanged.
pub fn excerpt(html: &str) -> String {
    let plain = to_plain_text(html);
    truncate_with_ellipsis(plain.trim(), EXCERPT_CHARS)
}

fn to_plain_text(html: &str) -> String {
    let mut text = html.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        let next = strip_tags(&decode_html_entities(&text));
        if next == text {
            break;
        }
        text = next;
    }
    text
}

/// Cut to `max_chars` characters and append `...`.
///
/// Text that fits within `max_chars` plus the ellipsis is left alone, so a
/// previously truncated string is never cut again.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars + ELLIPSIS.len() {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", text[..cut].trim_end(), ELLIPSIS),
        None => text.to_string(),
    }
}

/// URL-safe identifier derived from a title.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG.replace_all(&lower, "-").trim_matches('-').to_string()
}

/// Reading time from raw length, `ceil(chars / 1000)`, at least one minute.
pub fn read_time_from_len(text: &str) -> u32 {
    let minutes = text.chars().count().div_ceil(CHARS_PER_MINUTE);
    minutes.max(1) as u32
}

/// Reading time from word count, `ceil(words / 200)`, at least one minute.
pub fn read_time_from_words(text: &str) -> u32 {
    let minutes = text.split_whitespace().count().div_ceil(WORDS_PER_MINUTE);
    minutes.max(1) as u32
}

/// Parse the timestamp formats providers hand us.
///
/// Accepts RFC 3339, the feed proxy's `YYYY-MM-DD HH:MM:SS` (UTC) and
/// RFC 2822.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `Some(s)` unless the string is missing or blank.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
