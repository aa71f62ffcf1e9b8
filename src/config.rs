//! Run configuration.
//!
//! [`PipelineConfig`] is built once from the CLI (see [`crate::cli::Cli::pipeline_config`])
//! and handed to each stage explicitly, so every stage can be exercised in
//! isolation with its own settings.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Hard cap on the number of items published in one feed document.
pub const MAX_ITEMS: usize = 1000;

/// Maximum number of characters kept from an entry title.
pub const TITLE_MAX_CHARS: usize = 220;

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Newline-delimited feed list.
    pub feeds_path: PathBuf,
    /// Optional publisher catalog; a missing file is not an error.
    pub catalog_path: PathBuf,
    /// Destination of the JSON feed document (overwritten every run).
    pub output_path: PathBuf,
    /// ISO 639-1 code of the display / translation language.
    pub target_lang: String,
    /// Summary length cap, in characters.
    pub summary_max_chars: usize,
    /// Reduce summary markup to plain text.
    pub strip_html: bool,
    /// Pause after each feed fetch.
    pub feed_delay: Duration,
    /// Per-request timeout for feed downloads.
    pub fetch_timeout: Duration,
    /// Translation endpoint; `None` disables translation entirely.
    pub translate: Option<TranslateConfig>,
}

/// Connection details for a LibreTranslate-compatible endpoint.
#[derive(Clone)]
pub struct TranslateConfig {
    /// Base URL without trailing slash; requests go to `{base_url}/translate`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Pause after each translated item.
    pub pause: Duration,
}

impl fmt::Debug for TranslateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslateConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("pause", &self.pause)
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feeds_path: PathBuf::from("feeds.txt"),
            catalog_path: PathBuf::from("data/news_sources.csv"),
            output_path: PathBuf::from("docs/feed.json"),
            target_lang: "ja".to_string(),
            summary_max_chars: 1200,
            strip_html: true,
            feed_delay: Duration::from_millis(300),
            fetch_timeout: Duration::from_secs(20),
            translate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_api_key() {
        let config = TranslateConfig {
            base_url: "http://localhost:5000".to_string(),
            api_key: Some("s3cret".to_string()),
            timeout: Duration::from_secs(12),
            pause: Duration::from_millis(400),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
