//! # News Feed Builder
//!
//! Aggregates RSS/Atom feeds into a single JSON document for a static
//! front-end. Items are deduplicated, ordered newest first, optionally
//! machine-translated, and enriched with country / continent / language
//! metadata from a publisher catalog.
//!
//! ## Usage
//!
//! ```sh
//! TARGET_LANG=ja LT_URL=http://localhost:5000 news_feed_builder -f feeds.txt -o docs/feed.json
//! ```
//!
//! ## Architecture
//!
//! The application is a linear, single-task pipeline:
//! 1. **Fetching**: download each feed in `feeds.txt`, pausing between feeds
//! 2. **Normalizing**: canonical fields, clamped text, UTC timestamps
//! 3. **Deduplicating / sorting**: content-addressed identity, newest first
//! 4. **Translating** (optional): LibreTranslate-compatible endpoint
//! 5. **Enriching**: catalog or top-level-domain region, reading time
//! 6. **Output**: `docs/feed.json`, capped at 1000 items

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedup;
mod enrich;
mod feeds;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod translate;
mod utils;

#[cfg(test)]
mod test_support;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real environment variables still apply.
    let dotenv = dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "news_feed_builder starting up");
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    let config = args.pipeline_config();
    debug!(?config, "Resolved configuration");

    let doc = match pipeline::run(&config).await {
        Ok(doc) => doc,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        items = doc.count,
        output = %config.output_path.display(),
        "Execution complete"
    );
    Ok(())
}
