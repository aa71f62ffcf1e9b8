//! Entry normalization.
//!
//! Maps each [`RawEntry`] to a [`NormalizedItem`]: text fields are trimmed and
//! clamped, the publish timestamp is resolved through a fallback chain, and a
//! category is picked from the entry's tags. Every field read has a default,
//! so no single entry can fail the batch.

use crate::config::{PipelineConfig, TITLE_MAX_CHARS};
use crate::models::{FetchedFeed, NormalizedItem, RawEntry};
use crate::utils::{collapse_whitespace, iso_utc};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::Html;
use tracing::{debug, instrument};

const CATEGORY_MAX_CHARS: usize = 64;
const DEFAULT_CATEGORY: &str = "general";

/// Formats carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// Formats without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

/// Normalize every entry of a fetched feed, preserving entry order.
#[instrument(level = "debug", skip_all, fields(source = %feed.source, entries = feed.entries.len()))]
pub fn normalize_feed(feed: &FetchedFeed, config: &PipelineConfig) -> Vec<NormalizedItem> {
    let now = Utc::now();
    feed.entries
        .iter()
        .map(|entry| normalize_entry(&feed.source, entry, config, now))
        .collect()
}

/// Map one raw entry to the canonical item shape.
///
/// `now` is the publish time used when no date can be recovered.
pub fn normalize_entry(
    source: &str,
    entry: &RawEntry,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> NormalizedItem {
    let summary = [&entry.summary, &entry.description, &entry.content]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .map(|s| {
            if config.strip_html {
                plain_text(s)
            } else {
                s.to_string()
            }
        })
        .unwrap_or_default();

    NormalizedItem {
        source: source.to_string(),
        title: clamp(&entry.title, TITLE_MAX_CHARS),
        summary: clamp(&summary, config.summary_max_chars),
        link: entry.link.trim().to_string(),
        id: entry.id.trim().to_string(),
        published: resolve_published(entry, now),
        category: extract_category(entry),
    }
}

/// Resolve the publish timestamp as ISO-8601 UTC.
///
/// Tries `published`, `updated` and `created` as free-form dates, then the
/// reader's pre-parsed calendar date, then `now`.
pub fn resolve_published(entry: &RawEntry, now: DateTime<Utc>) -> String {
    let from_fields = [&entry.published, &entry.updated, &entry.created]
        .into_iter()
        .filter(|raw| !raw.trim().is_empty())
        .find_map(|raw| {
            let parsed = parse_datetime(raw);
            if parsed.is_none() {
                debug!(%raw, "Unparseable entry date");
            }
            parsed
        });

    let resolved = from_fields
        .or_else(|| {
            entry
                .published_parsed
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
        .unwrap_or(now);
    iso_utc(resolved)
}

/// Parse a free-form date string into UTC.
///
/// Strings without an offset are taken to be UTC already.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let s = match s.strip_suffix(" UTC") {
        Some(prefix) => format!("{prefix} +0000"),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Trim `s` and cap it at `max` characters, marking a cut with `…`.
pub fn clamp(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// First tag's `term`, else its `label`, else `"general"`.
pub fn extract_category(entry: &RawEntry) -> String {
    entry
        .tags
        .first()
        .and_then(|tag| {
            [&tag.term, &tag.label]
                .into_iter()
                .map(|s| s.trim())
                .find(|s| !s.is_empty())
        })
        .map(|s| s.chars().take(CATEGORY_MAX_CHARS).collect())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Reduce an HTML fragment to its text content.
fn plain_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}
