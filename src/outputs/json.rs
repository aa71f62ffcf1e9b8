//! JSON feed document generation.
//!
//! The document is the contract with the static front-end: pretty-printed
//! UTF-8 with non-ASCII characters kept as-is, written over the previous
//! run's file.

use crate::config::MAX_ITEMS;
use crate::models::{EnrichedItem, FeedDocument};
use crate::utils::now_iso;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Assemble the feed document, keeping at most [`MAX_ITEMS`] items.
pub fn build_document(mut items: Vec<EnrichedItem>, target_lang: &str) -> FeedDocument {
    items.truncate(MAX_ITEMS);
    FeedDocument {
        generated_at: now_iso(),
        target_lang: target_lang.to_string(),
        count: items.len(),
        items,
    }
}

/// Write a [`FeedDocument`] to `path`, creating the parent directory.
///
/// The write is not atomic; a failure can leave a truncated file that the
/// next run replaces.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = doc.count))]
pub async fn write_feed_document(doc: &FeedDocument, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(doc)?;

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    let bytes = json.len();
    fs::write(path, json).await?;
    info!(bytes, "Wrote JSON feed");
    Ok(())
}
