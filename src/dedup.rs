//! Deduplication and ordering of normalized items.

use crate::models::NormalizedItem;
use itertools::Itertools;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// Content-addressed identity of an item.
///
/// SHA-256 (lowercase hex) of the link, else the entry id, else title + source.
pub fn identity(item: &NormalizedItem) -> String {
    let base = if !item.link.is_empty() {
        item.link.clone()
    } else if !item.id.is_empty() {
        item.id.clone()
    } else {
        format!("{}{}", item.title, item.source)
    };
    format!("{:x}", Sha256::digest(base.as_bytes()))
}

/// Drop repeated items, keeping the first occurrence in fetch order.
#[instrument(level = "info", skip_all, fields(items = items.len()))]
pub fn dedup(items: Vec<NormalizedItem>) -> Vec<NormalizedItem> {
    let before = items.len();
    let unique: Vec<NormalizedItem> = items.into_iter().unique_by(identity).collect();
    info!(before, after = unique.len(), "Deduplicated items");
    unique
}

/// Stable sort by `published`, newest first.
pub fn sort_newest_first(items: &mut [NormalizedItem]) {
    items.sort_by(|a, b| b.published.cmp(&a.published));
}
