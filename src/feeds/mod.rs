//! Feed fetching.
//!
//! The fetcher follows a two-phase pattern:
//!
//! 1. **Listing**: read feed URLs from `feeds.txt` ([`read_feed_list`])
//! 2. **Fetching**: download and parse each feed in list order ([`fetch_feeds`])
//!
//! Fetching is strictly sequential with a fixed pause after every feed. A
//! feed that cannot be downloaded or parsed is logged and skipped; it never
//! aborts the run.

pub mod parser;

use crate::models::FetchedFeed;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = concat!("news_feed_builder/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for every feed download of a run.
pub fn build_client(timeout: Duration) -> Result<Client, Box<dyn Error>> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Read the feed list: one URL per line, blank lines and `#` comments ignored.
///
/// # Errors
///
/// Fails when the file cannot be read; without a feed list there is nothing
/// to publish.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_feed_list(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let urls = parse_feed_list(&text);
    info!(count = urls.len(), "Loaded feed list");
    Ok(urls)
}

fn parse_feed_list(text: &str) -> Vec<String> {
    // Trimmed first, so an indented `#` line is a comment too.
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Fetch all feeds in order, pausing `delay` after each one.
///
/// Failed feeds are logged and left out of the result.
#[instrument(level = "info", skip_all, fields(feeds = urls.len()))]
pub async fn fetch_feeds(client: &Client, urls: Vec<String>, delay: Duration) -> Vec<FetchedFeed> {
    let feeds: Vec<FetchedFeed> = stream::iter(urls)
        .then(|url: String| async move {
            let result = match fetch_feed(client, &url).await {
                Ok(feed) => {
                    debug!(%url, source = %feed.source, entries = feed.entries.len(), "Fetched feed");
                    Some(feed)
                }
                Err(e) => {
                    warn!(%url, error = %e, "Feed fetch failed; skipping");
                    None
                }
            };
            sleep(delay).await;
            result
        })
        .filter_map(|opt| std::future::ready(opt))
        .collect()
        .await;

    let entries: usize = feeds.iter().map(|f| f.entries.len()).sum();
    info!(feeds = feeds.len(), entries, "Fetched feed contents");
    feeds
}

/// Download and parse a single feed.
#[instrument(level = "debug", skip_all, fields(%url))]
async fn fetch_feed(client: &Client, url: &str) -> Result<FetchedFeed, Box<dyn Error>> {
    let resp = client.get(url).send().await?.error_for_status()?;
    let charset = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_param);
    let bytes = resp.bytes().await?;
    let body = parser::decode_document(&bytes, charset.as_deref());
    let parsed = parser::parse_feed(&body)?;

    Ok(FetchedFeed {
        source: parsed.title.unwrap_or_else(|| url.to_string()),
        entries: parsed.entries,
    })
}

/// The `charset` parameter of a `Content-Type` value.
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, unreachable_url};

    const TWO_ENTRIES_SAME_LINK: &str = r#"<rss version="2.0"><channel>
<title>Dup Feed</title>
<item><title>One</title><link>http://x/a</link></item>
<item><title>Two</title><link>http://x/a</link></item>
</channel></rss>"#;

    #[test]
    fn test_parse_feed_list_skips_comments_and_blanks() {
        let text = "# news\nhttps://a.example/rss\n\n   \n#https://off.example/rss\n  # indented note\n  https://b.example/atom  \n";
        assert_eq!(
            parse_feed_list(text),
            vec!["https://a.example/rss", "https://b.example/atom"]
        );
    }

    #[tokio::test]
    async fn test_fetch_feeds_reads_served_feed() {
        let url = serve(200, "application/rss+xml", TWO_ENTRIES_SAME_LINK).await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let feeds = fetch_feeds(&client, vec![url], Duration::ZERO).await;
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].source, "Dup Feed");
        assert_eq!(feeds[0].entries.len(), 2);
    }

    #[tokio::test]
    async fn test_bad_feeds_are_skipped() {
        let good = serve(200, "application/rss+xml", TWO_ENTRIES_SAME_LINK).await;
        let not_found = serve(404, "text/plain", "missing").await;
        let html = serve(200, "text/html", "<html><body>hi</body></html>").await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let feeds = fetch_feeds(
            &client,
            vec![unreachable_url().await, not_found, html, good],
            Duration::ZERO,
        )
        .await;
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].source, "Dup Feed");
    }

    #[tokio::test]
    async fn test_untitled_feed_uses_url_as_source() {
        let url = serve(
            200,
            "application/rss+xml",
            "<rss><channel><item><title>x</title></item></channel></rss>",
        )
        .await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let feeds = fetch_feeds(&client, vec![url.clone()], Duration::ZERO).await;
        assert_eq!(feeds[0].source, url);
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(
            charset_param("application/rss+xml; charset=Shift_JIS").as_deref(),
            Some("Shift_JIS")
        );
        assert_eq!(charset_param(r#"text/xml;Charset="euc-jp""#).as_deref(), Some("euc-jp"));
        assert_eq!(charset_param("application/rss+xml"), None);
    }

    #[tokio::test]
    async fn test_shift_jis_feed_is_decoded() {
        let mut body = br#"<?xml version="1.0" encoding="Shift_JIS"?><rss><channel><title>"#.to_vec();
        body.extend_from_slice(b"\x93\xfa\x96\x7b");
        body.extend_from_slice(b"</title><item><title>x</title></item></channel></rss>");
        let with_header = serve(200, "application/rss+xml; charset=Shift_JIS", &body).await;
        let declaration_only = serve(200, "application/rss+xml", &body).await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let feeds = fetch_feeds(&client, vec![with_header, declaration_only], Duration::ZERO).await;
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].source, "日本");
        assert_eq!(feeds[1].source, "日本");
    }

    #[tokio::test]
    async fn test_missing_feed_list_is_an_error() {
        let path = std::env::temp_dir().join("news_feed_builder_no_such_feeds.txt");
        assert!(read_feed_list(&path).await.is_err());
    }
}
