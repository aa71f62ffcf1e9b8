//! Publisher catalog (`data/news_sources.csv`).
//!
//! The catalog maps known publishers to country, continent and language.
//! It is indexed by the lowercased host of each publisher's website and by
//! the lowercased publisher name. All indices keep the first row in file
//! order when several rows share a key.

use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};
use url::Url;

/// One catalog row. Columns other than these five are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub website_url: String,
}

/// What an item offers for matching against the catalog.
#[derive(Debug)]
pub struct MatchKey {
    /// Lowercased host of the item link (may be empty).
    pub domain: String,
    /// Lowercased, trimmed feed source name.
    pub name: String,
}

impl MatchKey {
    pub fn new(source: &str, link: &str) -> Self {
        Self {
            domain: host_of(link),
            name: source.trim().to_lowercase(),
        }
    }
}

/// A lookup strategy: total, returns a row index or nothing.
type Strategy = fn(&Catalog, &MatchKey) -> Option<usize>;

/// Strategies in order of confidence; the first hit wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("domain", Catalog::by_domain),
    ("exact_name", Catalog::by_exact_name),
    ("name_substring", Catalog::by_name_substring),
];

#[derive(Debug, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
    by_domain: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    /// Lowercased names in file order, for substring matching.
    names: Vec<(String, usize)>,
}

impl Catalog {
    /// Load the catalog from a CSV file.
    ///
    /// A missing file yields `Ok(None)`. Malformed rows and rows without a
    /// name are skipped.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Option<Self>, Box<dyn Error>> {
        if !path.exists() {
            info!("No catalog file; falling back to domain heuristics");
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<CatalogRow>().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => warn!(line = line + 2, error = %e, "Skipping malformed catalog row"),
            }
        }
        let catalog = Self::from_rows(rows);
        info!(rows = catalog.len(), domains = catalog.by_domain.len(), "Loaded catalog");
        Ok(Some(catalog))
    }

    /// Build the indices from rows in file order.
    pub fn from_rows(rows: impl IntoIterator<Item = CatalogRow>) -> Self {
        let mut catalog = Self::default();
        for row in rows {
            let name = row.name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let idx = catalog.rows.len();
            catalog.by_name.entry(name.clone()).or_insert(idx);
            catalog.names.push((name, idx));
            let domain = host_of(row.website_url.trim());
            if !domain.is_empty() {
                catalog.by_domain.entry(domain).or_insert(idx);
            }
            catalog.rows.push(row);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Run the strategy chain; returns the matched row and the strategy name.
    pub fn lookup(&self, key: &MatchKey) -> Option<(&CatalogRow, &'static str)> {
        STRATEGIES
            .iter()
            .find_map(|(label, strategy)| strategy(self, key).map(|idx| (&self.rows[idx], *label)))
    }

    fn by_domain(&self, key: &MatchKey) -> Option<usize> {
        if key.domain.is_empty() {
            return None;
        }
        self.by_domain.get(&key.domain).copied()
    }

    fn by_exact_name(&self, key: &MatchKey) -> Option<usize> {
        self.by_name.get(&key.name).copied()
    }

    fn by_name_substring(&self, key: &MatchKey) -> Option<usize> {
        if key.name.is_empty() {
            return None;
        }
        self.names
            .iter()
            .find(|(name, _)| key.name.contains(name.as_str()))
            .map(|(_, idx)| *idx)
    }
}

/// Lowercased host of a URL, or empty when it has none.
pub fn host_of(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}
