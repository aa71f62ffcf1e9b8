//! Command-line interface definitions for the feed builder.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every argument can be provided via a command-line flag or an environment
//! variable, so the same binary runs unchanged from a shell, a cron entry or
//! a CI workflow that only sets `TARGET_LANG` / `LT_URL`.

use crate::config::{PipelineConfig, TranslateConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the feed builder.
///
/// # Examples
///
/// ```sh
/// # Defaults: feeds.txt -> docs/feed.json, Japanese labels, no translation
/// news_feed_builder
///
/// # Translate into English through a LibreTranslate instance
/// TARGET_LANG=en LT_URL=http://localhost:5000 news_feed_builder
///
/// # Custom paths
/// news_feed_builder -f ./feeds.txt -c ./data/news_sources.csv -o ./public/feed.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Newline-delimited list of feed URLs (`#` starts a comment line)
    #[arg(short, long, env = "FEEDS_FILE", default_value = "feeds.txt")]
    pub feeds: PathBuf,

    /// Optional publisher catalog (CSV with name,country,continent,language,website_url,...)
    #[arg(short, long, env = "CATALOG_CSV", default_value = "data/news_sources.csv")]
    pub catalog: PathBuf,

    /// Output path of the generated JSON feed
    #[arg(short, long, env = "FEED_OUT", default_value = "docs/feed.json")]
    pub output: PathBuf,

    /// Language titles and summaries are translated into
    #[arg(long, env = "TARGET_LANG", default_value = "ja")]
    pub target_lang: String,

    /// Base URL of a LibreTranslate-compatible endpoint (empty disables translation)
    #[arg(long, env = "LT_URL", default_value = "")]
    pub lt_url: String,

    /// API key sent along with translation requests
    #[arg(long, env = "LT_API_KEY")]
    pub lt_api_key: Option<String>,

    /// Maximum number of characters kept from an entry summary
    #[arg(long, env = "SUMMARY_MAX_CHARS", default_value_t = 1200)]
    pub summary_max_chars: usize,

    /// Pause after each feed fetch, in milliseconds
    #[arg(long, env = "FEED_DELAY_MS", default_value_t = 300)]
    pub feed_delay_ms: u64,

    /// Pause after each translated item, in milliseconds
    #[arg(long, env = "TRANSLATE_DELAY_MS", default_value_t = 400)]
    pub translate_delay_ms: u64,

    /// Per-request timeout for feed downloads, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    /// Per-request timeout for translation calls, in seconds
    #[arg(long, env = "TRANSLATE_TIMEOUT_SECS", default_value_t = 12)]
    pub translate_timeout_secs: u64,

    /// Keep summary markup as published instead of reducing it to plain text
    #[arg(long, env = "KEEP_HTML")]
    pub keep_html: bool,
}

impl Cli {
    /// Turn the parsed arguments into the configuration value threaded
    /// through every pipeline stage.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let base_url = self.lt_url.trim().trim_end_matches('/');
        let translate = (!base_url.is_empty()).then(|| TranslateConfig {
            base_url: base_url.to_string(),
            api_key: self.lt_api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(self.translate_timeout_secs),
            pause: Duration::from_millis(self.translate_delay_ms),
        });

        PipelineConfig {
            feeds_path: self.feeds.clone(),
            catalog_path: self.catalog.clone(),
            output_path: self.output.clone(),
            target_lang: self.target_lang.trim().to_string(),
            summary_max_chars: self.summary_max_chars,
            strip_html: !self.keep_html,
            feed_delay: Duration::from_millis(self.feed_delay_ms),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            translate,
        }
    }
}
