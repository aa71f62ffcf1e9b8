//! Data models flowing through the pipeline.
//!
//! - [`RawEntry`]: one entry as read from a feed document, fields untouched
//! - [`FetchedFeed`]: all entries of one feed plus its provisional source name
//! - [`NormalizedItem`]: canonical item after field resolution and truncation
//! - [`Translation`]: translated title/summary and the detected language
//! - [`EnrichedItem`]: the published item schema
//! - [`FeedDocument`]: the JSON document consumed by the static front-end
//!
//! Only [`EnrichedItem`] and [`FeedDocument`] are serialized; their field names
//! are a published contract and must not change.

use serde::{Deserialize, Serialize};

/// A single feed entry with every field as supplied by the feed.
///
/// Absent elements are empty strings (or `None` for the pre-parsed date), so
/// downstream stages never fail on a missing field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    /// `guid` (RSS) or `id` (Atom).
    pub id: String,
    /// Atom `summary`.
    pub summary: String,
    /// RSS `description`.
    pub description: String,
    /// `content:encoded` (RSS) or `content` (Atom).
    pub content: String,
    /// Raw `pubDate` / `published` / `dc:date` / `issued`.
    pub published: String,
    /// Raw `updated` / `modified`.
    pub updated: String,
    /// Raw `created`.
    pub created: String,
    /// Calendar date recovered by the feed reader's tolerant scan.
    pub published_parsed: Option<chrono::NaiveDate>,
    pub tags: Vec<Tag>,
}

/// A category / tag attached to an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub term: String,
    pub label: String,
}

/// All entries of one successfully fetched feed.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// Feed-level title, or the feed URL when the feed has none.
    pub source: String,
    pub entries: Vec<RawEntry>,
}

/// Canonical item produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub source: String,
    /// At most 220 characters.
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Entry id; only used for identity, never published.
    pub id: String,
    /// ISO-8601 UTC, `YYYY-MM-DDTHH:MM:SS+00:00`.
    pub published: String,
    pub category: String,
}

/// Result of running the translator over one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub title: String,
    pub summary: String,
    /// ISO code of the detected source language, if any.
    pub lang: Option<String>,
}

impl Translation {
    /// The identity translation used when translation is disabled.
    pub fn untranslated(item: &NormalizedItem) -> Self {
        Self {
            title: item.title.clone(),
            summary: item.summary.clone(),
            lang: None,
        }
    }
}

/// A published feed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub title: String,
    pub title_translated: String,
    pub summary: String,
    pub summary_translated: String,
    pub link: String,
    /// Catalog canonical name when matched, otherwise the feed title.
    pub source: String,
    pub published: String,
    /// Catalog language, else detected ISO code, else `"unknown"`.
    pub language: String,
    pub lang_detected: Option<String>,
    pub country: String,
    pub continent: String,
    pub category: String,
    pub reading_time_minutes: u32,
}

/// The document written to `docs/feed.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub generated_at: String,
    pub target_lang: String,
    pub count: usize,
    pub items: Vec<EnrichedItem>,
}
