//! Stage orchestration.
//!
//! fetch → normalize → dedup → sort → translate → enrich → serialize, one
//! stage after another on a single task.

use crate::config::{MAX_ITEMS, PipelineConfig};
use crate::dedup::{dedup, sort_newest_first};
use crate::enrich::Enricher;
use crate::enrich::catalog::Catalog;
use crate::feeds;
use crate::models::{FeedDocument, FetchedFeed, NormalizedItem};
use crate::normalize::normalize_feed;
use crate::outputs::json;
use crate::translate::{TranslateAsync, Translator};
use crate::utils::ensure_writable_parent;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Normalize, deduplicate and order the fetched entries, newest first.
///
/// Only the newest [`MAX_ITEMS`] are kept so later stages never work on items
/// that cannot be published.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub fn collect_items(feeds: &[FetchedFeed], config: &PipelineConfig) -> Vec<NormalizedItem> {
    let normalized: Vec<NormalizedItem> = feeds
        .iter()
        .flat_map(|feed| normalize_feed(feed, config))
        .collect();
    let mut items = dedup(normalized);
    sort_newest_first(&mut items);
    if items.len() > MAX_ITEMS {
        info!(dropped = items.len() - MAX_ITEMS, "Dropping oldest items over the cap");
        items.truncate(MAX_ITEMS);
    }
    items
}

/// Turn fetched feeds into the finished document.
pub async fn process<T>(
    feeds: &[FetchedFeed],
    translator: &Translator<T>,
    enricher: &Enricher,
    config: &PipelineConfig,
) -> FeedDocument
where
    T: TranslateAsync,
{
    let items = collect_items(feeds, config);
    let translations = translator.translate_all(&items).await;
    let enriched = enricher.enrich_all(items, translations);
    json::build_document(enriched, &config.target_lang)
}

/// Execute one complete run and write the output file.
///
/// # Errors
///
/// Only fatal conditions surface: unreadable feed list, unwritable output
/// location, or a failed write. Feed, translation and catalog problems are
/// logged and absorbed.
#[instrument(level = "info", skip_all, fields(output = %config.output_path.display(), target_lang = %config.target_lang))]
pub async fn run(config: &PipelineConfig) -> Result<FeedDocument, Box<dyn Error>> {
    ensure_writable_parent(&config.output_path).await?;

    let urls = feeds::read_feed_list(&config.feeds_path).await?;
    let catalog = match Catalog::load(&config.catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(path = %config.catalog_path.display(), error = %e, "Catalog unreadable; continuing without it");
            None
        }
    };
    let enricher = Enricher::new(catalog, &config.target_lang);
    let translator = Translator::from_config(config.translate.as_ref(), &config.target_lang)?;
    info!(
        translation = translator.is_enabled(),
        catalog = enricher.uses_catalog(),
        "Pipeline configured"
    );

    let client = feeds::build_client(config.fetch_timeout)?;
    let fetched = feeds::fetch_feeds(&client, urls, config.feed_delay).await;

    let doc = process(&fetched, &translator, &enricher, config).await;
    json::write_feed_document(&doc, &config.output_path).await?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use crate::models::RawEntry;
    use crate::test_support::{serve, serve_recording, unreachable_url};
    use std::path::PathBuf;
    use std::time::Duration;

    fn entry(title: &str, link: &str, published: &str) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            link: link.to_string(),
            published: published.to_string(),
            ..Default::default()
        }
    }

    fn feed(source: &str, entries: Vec<RawEntry>) -> FetchedFeed {
        FetchedFeed {
            source: source.to_string(),
            entries,
        }
    }

    /// Scratch directory holding a feeds.txt pointing at `urls`.
    fn scratch(name: &str, urls: &[String]) -> (PathBuf, PipelineConfig) {
        let dir = std::env::temp_dir().join(format!("nfb_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let feeds_path = dir.join("feeds.txt");
        std::fs::write(&feeds_path, format!("# test feeds\n\n{}\n", urls.join("\n"))).unwrap();
        let config = PipelineConfig {
            feeds_path,
            catalog_path: dir.join("missing.csv"),
            output_path: dir.join("docs").join("feed.json"),
            feed_delay: Duration::ZERO,
            fetch_timeout: Duration::from_secs(5),
            ..PipelineConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_collect_items_orders_newest_first() {
        let feeds = vec![
            feed(
                "A",
                vec![
                    entry("old", "http://a/1", "2025-01-01T00:00:00Z"),
                    entry("newest", "http://a/2", "2025-03-01T00:00:00Z"),
                ],
            ),
            feed("B", vec![entry("middle", "http://b/1", "Sat, 01 Feb 2025 00:00:00 GMT")]),
        ];
        let items = collect_items(&feeds, &PipelineConfig::default());
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle", "old"]);
    }

    #[test]
    fn test_duplicate_across_feeds_keeps_first_feed() {
        let feeds = vec![
            feed("First", vec![entry("one", "http://x/a", "2025-01-01T00:00:00Z")]),
            feed("Second", vec![entry("two", "http://x/a", "2025-02-01T00:00:00Z")]),
        ];
        let items = collect_items(&feeds, &PipelineConfig::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "First");
    }

    #[test]
    fn test_cap_keeps_most_recent() {
        let start = chrono::DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap();
        let entries = (0..1500)
            .map(|n| {
                let at = start + chrono::Duration::hours(n);
                entry(&format!("t{n}"), &format!("http://x/{n}"), &at.to_rfc3339())
            })
            .collect();
        let items = collect_items(&[feed("F", entries)], &PipelineConfig::default());

        assert_eq!(items.len(), 1000);
        assert_eq!(items[0].title, "t1499");
        assert_eq!(items[999].title, "t500");
        assert!(items.windows(2).all(|w| w[0].published >= w[1].published));
    }

    #[tokio::test]
    async fn test_process_is_idempotent_without_translation() {
        let feeds = vec![feed(
            "Example News - World",
            vec![
                entry("a", "https://www.example.co.jp/a", "2025-01-01T00:00:00Z"),
                entry("b", "https://www.example.com/b", "2025-01-02T00:00:00Z"),
            ],
        )];
        let config = PipelineConfig::default();
        let translator: Translator<crate::translate::LibreTranslate> = Translator::disabled("ja");
        let enricher = Enricher::new(None, "ja");

        let first = process(&feeds, &translator, &enricher, &config).await;
        let second = process(&feeds, &translator, &enricher, &config).await;
        assert_eq!(first.items, second.items);
        assert_eq!(first.count, 2);
        assert_eq!(first.items[0].country, "不明");
        assert_eq!(first.items[1].country, "日本");
    }

    #[tokio::test]
    async fn test_run_with_duplicate_links_and_unreachable_feed() {
        let rss = r#"<rss version="2.0"><channel><title>Dup</title>
<item><title>First title</title><link>http://x/a</link><pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate></item>
<item><title>Second title</title><link>http://x/a</link><pubDate>Wed, 07 May 2025 14:30:00 GMT</pubDate></item>
</channel></rss>"#;
        let good = serve(200, "application/rss+xml", rss).await;
        let (dir, config) = scratch("run", &[unreachable_url().await, good]);

        let doc = run(&config).await.unwrap();
        let written: FeedDocument =
            serde_json::from_str(&std::fs::read_to_string(&config.output_path).unwrap()).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(doc.count, 1);
        assert_eq!(written.items.len(), 1);
        assert_eq!(written.items[0].title, "First title");
        assert_eq!(written.items[0].source, "Dup");
        assert_eq!(written.target_lang, "ja");
    }

    #[tokio::test]
    async fn test_run_with_only_unreachable_feed_still_writes() {
        let (dir, config) = scratch("unreachable", &[unreachable_url().await]);

        let doc = run(&config).await.unwrap();
        let exists = config.output_path.exists();
        let _ = std::fs::remove_dir_all(&dir);

        assert!(exists);
        assert_eq!(doc.count, 0);
        assert!(doc.items.is_empty());
    }

    #[tokio::test]
    async fn test_run_translates_through_endpoint() {
        let rss = r#"<rss version="2.0"><channel><title>Wire</title>
<item><title>Markets rallied strongly today after the central bank held interest rates steady</title>
<link>http://wire/1</link><description>Stocks rose across the board as investors welcomed the decision</description></item>
</channel></rss>"#;
        let feed_url = serve(200, "application/rss+xml", rss).await;
        let translate = serve_recording(200, "application/json", r#"{"translatedText":"翻訳"}"#).await;
        let (dir, mut config) = scratch("translate", &[feed_url]);
        config.translate = Some(TranslateConfig {
            base_url: translate.url.clone(),
            api_key: None,
            timeout: Duration::from_secs(5),
            pause: Duration::ZERO,
        });

        let doc = run(&config).await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(translate.request_count(), 2);
        let item = &doc.items[0];
        assert_eq!(item.title_translated, "翻訳");
        assert_eq!(item.summary_translated, "翻訳");
        assert_eq!(item.lang_detected.as_deref(), Some("en"));
        assert_eq!(item.language, "en");
    }

    #[tokio::test]
    async fn test_run_fails_when_output_parent_is_a_file() {
        let (dir, mut config) = scratch("blocked", &[unreachable_url().await]);
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        config.output_path = blocker.join("feed.json");

        let result = run(&config).await;
        let _ = std::fs::remove_dir_all(&dir);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_fails_without_feed_list() {
        let (dir, mut config) = scratch("nolist", &[]);
        config.feeds_path = dir.join("absent.txt");
        let result = run(&config).await;
        let _ = std::fs::remove_dir_all(&dir);
        assert!(result.is_err());
    }
}
