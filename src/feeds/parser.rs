//! Streaming RSS / Atom entry reader.
//!
//! Feeds are read with `quick-xml` events rather than a fixed serde schema so
//! that one pass handles RSS 2.0, RSS 1.0 (RDF) and Atom, namespaced elements
//! (`dc:date`, `content:encoded`) match on their local name, and date fields
//! keep the exact string the publisher wrote. Date interpretation is left to
//! [`crate::normalize`].
//!
//! For every element repeated inside one entry, the first non-empty
//! occurrence wins.
//!
//! Bodies are decoded to UTF-8 first ([`decode_document`]): the HTTP charset
//! wins, then a byte-order mark, then the `encoding` of the XML declaration.

use crate::models::{RawEntry, Tag};
use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use scraper::Html;
use std::error::Error;
use tracing::debug;

static CALENDAR_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid date regex"));

static XML_DECLARED_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("valid declaration regex")
});

/// Decode a downloaded feed body to UTF-8.
///
/// `charset` is the parameter of the response `Content-Type`, if any. Unknown
/// labels are ignored and malformed sequences become U+FFFD.
pub fn decode_document(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);
    // A byte-order mark overrides the chosen encoding.
    let (text, used, malformed) = encoding.decode(bytes);
    if used != UTF_8 || malformed {
        debug!(encoding = used.name(), malformed, "Decoded feed body");
    }
    text.into_owned()
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let caps = XML_DECLARED_ENCODING.captures(&head)?;
    Encoding::for_label(caps[1].as_bytes())
}

/// A parsed feed document.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    /// Channel / feed title, if the document has one.
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
}

/// Which [`RawEntry`] field the text of the current child element feeds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Title,
    Link,
    Id,
    Summary,
    Description,
    Content,
    Published,
    Updated,
    Created,
    Tag,
}

impl Slot {
    fn for_element(name: &str) -> Option<Self> {
        Some(match name {
            "title" => Self::Title,
            "link" => Self::Link,
            "guid" | "id" => Self::Id,
            "summary" => Self::Summary,
            "description" => Self::Description,
            "encoded" | "content" => Self::Content,
            "pubDate" | "published" | "date" | "issued" => Self::Published,
            "updated" | "modified" => Self::Updated,
            "created" => Self::Created,
            "category" | "subject" => Self::Tag,
            _ => return None,
        })
    }

    fn target(self, entry: &mut RawEntry) -> Option<&mut String> {
        Some(match self {
            Self::Title => &mut entry.title,
            Self::Link => &mut entry.link,
            Self::Id => &mut entry.id,
            Self::Summary => &mut entry.summary,
            Self::Description => &mut entry.description,
            Self::Content => &mut entry.content,
            Self::Published => &mut entry.published,
            Self::Updated => &mut entry.updated,
            Self::Created => &mut entry.created,
            Self::Tag => &mut entry.tags.last_mut()?.term,
        })
    }
}

/// Entry currently being read.
struct OpenEntry {
    /// Element depth at which the entry element itself sits.
    depth: usize,
    entry: RawEntry,
    slot: Option<Slot>,
    /// Markup was crossed since the last text of the current slot.
    split: bool,
}

/// Parse a feed document into its title and raw entries.
///
/// # Errors
///
/// Returns an error when the document is not well-formed XML or its root
/// element is not `rss`, `feed` or `RDF`.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed = ParsedFeed::default();
    let mut path: Vec<String> = Vec::new();
    let mut open: Option<OpenEntry> = None;
    let mut feed_title = String::new();
    let mut feed_title_done = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                if path.is_empty() && !matches!(name.as_str(), "rss" | "feed" | "RDF") {
                    return Err(format!("unsupported feed root element <{name}>").into());
                }
                if open.is_none() && matches!(name.as_str(), "item" | "entry") {
                    open = Some(OpenEntry {
                        depth: path.len(),
                        entry: RawEntry::default(),
                        slot: None,
                        split: false,
                    });
                } else if let Some(o) = open.as_mut().filter(|o| path.len() == o.depth + 1) {
                    apply_attributes(&mut o.entry, &name, &e);
                    o.slot = Slot::for_element(&name).filter(|slot| {
                        slot.target(&mut o.entry).is_some_and(|t| t.is_empty())
                    });
                    o.split = false;
                } else if let Some(o) = open.as_mut() {
                    o.split = true;
                }
                path.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                if let Some(o) = open.as_mut() {
                    if path.len() == o.depth + 1 {
                        apply_attributes(&mut o.entry, &name, &e);
                    } else {
                        o.split = true;
                    }
                }
            }
            Event::End(_) => {
                if open.is_none() && is_feed_title(&path) && !feed_title.is_empty() {
                    feed_title_done = true;
                }
                path.pop();
                if let Some(o) = open.as_mut() {
                    o.split = true;
                    if path.len() == o.depth + 1 {
                        o.slot = None;
                    }
                }
                if open.as_ref().is_some_and(|o| path.len() == o.depth) {
                    if let Some(o) = open.take() {
                        feed.entries.push(finish_entry(o.entry));
                    }
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| decode_html_entities(&String::from_utf8_lossy(&t)));
                push_text(&mut open, &path, &mut feed_title, feed_title_done, &text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_text(&mut open, &path, &mut feed_title, feed_title_done, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let feed_title = feed_title.trim();
    if !feed_title.is_empty() {
        feed.title = Some(feed_title.to_string());
    }
    Ok(feed)
}

fn push_text(
    open: &mut Option<OpenEntry>,
    path: &[String],
    feed_title: &mut String,
    feed_title_done: bool,
    text: &str,
) {
    match open {
        Some(o) => {
            let split = std::mem::take(&mut o.split);
            let Some(slot) = o.slot else {
                return;
            };
            let Some(target) = slot.target(&mut o.entry) else {
                return;
            };
            // Text is trimmed, so words on either side of an inline element
            // need a separator back.
            if split && !target.is_empty() {
                target.push(' ');
            }
            target.push_str(text);
        }
        None if !feed_title_done && is_feed_title(path) => feed_title.push_str(text),
        None => {}
    }
}

/// Resolve HTML entities (`&nbsp;`, `&rsquo;`) that XML does not define.
///
/// The input is raw XML character data, so it holds no literal `<` and the
/// HTML fragment parser only decodes references.
fn decode_html_entities(raw: &str) -> String {
    Html::parse_fragment(raw).root_element().text().collect()
}

/// `channel > title` or `feed > title`, never `image > title`.
fn is_feed_title(path: &[String]) -> bool {
    match path {
        [.., parent, last] => {
            last == "title" && matches!(parent.as_str(), "channel" | "feed")
        }
        _ => false,
    }
}

fn apply_attributes(entry: &mut RawEntry, name: &str, e: &BytesStart<'_>) {
    match name {
        "link" => {
            let rel = attribute(e, "rel");
            if entry.link.is_empty() && rel.as_deref().is_none_or(|r| r == "alternate") {
                if let Some(href) = attribute(e, "href") {
                    entry.link = href;
                }
            }
        }
        "category" | "subject" => entry.tags.push(Tag {
            term: attribute(e, "term").unwrap_or_default(),
            label: attribute(e, "label").unwrap_or_default(),
        }),
        _ => {}
    }
}

fn finish_entry(mut entry: RawEntry) -> RawEntry {
    for field in [
        &mut entry.title,
        &mut entry.link,
        &mut entry.id,
        &mut entry.summary,
        &mut entry.description,
        &mut entry.content,
        &mut entry.published,
        &mut entry.updated,
        &mut entry.created,
    ] {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }
    entry.tags.retain(|t| !t.term.trim().is_empty() || !t.label.trim().is_empty());
    entry.published_parsed = [&entry.published, &entry.updated, &entry.created]
        .into_iter()
        .find_map(|raw| scan_calendar_date(raw));
    entry
}

/// Tolerant fallback: the first `YYYY-MM-DD` found anywhere in the string.
fn scan_calendar_date(raw: &str) -> Option<NaiveDate> {
    let caps = CALENDAR_DATE.captures(raw)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
