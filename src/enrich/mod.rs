//! Item enrichment: region and language metadata plus reading time.
//!
//! Two strategies, chosen once per run:
//!
//! - [`catalog`]: match the item against the publisher catalog (domain, then
//!   exact name, then name substring)
//! - [`tld`]: guess the region from the link's top-level domain, used only
//!   when no catalog rows are available
//!
//! Missing values fall back to sentinels: country/continent `不明` for a
//! Japanese display language (`unknown` otherwise), language `unknown`.

pub mod catalog;
pub mod tld;

use crate::models::{EnrichedItem, NormalizedItem, Translation};
use catalog::{Catalog, MatchKey, host_of};
use tracing::{debug, info, instrument};

/// Language value when neither the catalog nor detection knows it.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Assumed reading speed, words per minute.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Sentinel for unknown country / continent in the display language.
pub fn unknown_region(lang: &str) -> &'static str {
    if lang == "ja" { "不明" } else { "unknown" }
}

/// Estimated reading time in whole minutes, never below one.
///
/// Halves round to even.
pub fn estimate_reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count() as f64;
    ((words / WORDS_PER_MINUTE).round_ties_even() as u32).max(1)
}

#[derive(Debug, Default, PartialEq)]
struct Region {
    country: Option<String>,
    continent: Option<String>,
    language: Option<String>,
    name: Option<String>,
}

#[derive(Debug)]
pub struct Enricher {
    catalog: Option<Catalog>,
    target_lang: String,
}

impl Enricher {
    /// An empty catalog counts as no catalog.
    pub fn new(catalog: Option<Catalog>, target_lang: &str) -> Self {
        Self {
            catalog: catalog.filter(|c| !c.is_empty()),
            target_lang: target_lang.to_string(),
        }
    }

    pub fn uses_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    fn region(&self, item: &NormalizedItem) -> Region {
        match &self.catalog {
            Some(catalog) => {
                let key = MatchKey::new(&item.source, &item.link);
                match catalog.lookup(&key) {
                    Some((row, strategy)) => {
                        debug!(source = %item.source, matched = %row.name, strategy, "Catalog match");
                        Region {
                            country: non_empty(&row.country),
                            continent: non_empty(&row.continent),
                            language: non_empty(&row.language),
                            name: non_empty(&row.name),
                        }
                    }
                    None => Region::default(),
                }
            }
            None => match tld::region_for_host(&host_of(&item.link)) {
                Some(r) => {
                    let (country, continent) = r.labels(&self.target_lang);
                    Region {
                        country: Some(country.to_string()),
                        continent: Some(continent.to_string()),
                        ..Region::default()
                    }
                }
                None => Region::default(),
            },
        }
    }

    /// Attach metadata to one translated item.
    pub fn enrich(&self, item: NormalizedItem, translation: Translation) -> EnrichedItem {
        let region = self.region(&item);
        let unknown = unknown_region(&self.target_lang);

        let basis = [&translation.summary, &item.summary, &item.title]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or_default();
        let reading_time_minutes = estimate_reading_time(basis);

        let language = region
            .language
            .or_else(|| translation.lang.clone())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
        let title_translated = if translation.title.is_empty() {
            item.title.clone()
        } else {
            translation.title
        };
        let summary_translated = if translation.summary.is_empty() {
            item.summary.clone()
        } else {
            translation.summary
        };

        EnrichedItem {
            title: item.title,
            title_translated,
            summary: item.summary,
            summary_translated,
            link: item.link,
            source: region.name.unwrap_or(item.source),
            published: item.published,
            language,
            lang_detected: translation.lang,
            country: region.country.unwrap_or_else(|| unknown.to_string()),
            continent: region.continent.unwrap_or_else(|| unknown.to_string()),
            category: item.category,
            reading_time_minutes,
        }
    }

    /// Enrich items pairwise with their translations, preserving order.
    #[instrument(level = "info", skip_all, fields(items = items.len(), catalog = self.uses_catalog()))]
    pub fn enrich_all(
        &self,
        items: Vec<NormalizedItem>,
        translations: Vec<Translation>,
    ) -> Vec<EnrichedItem> {
        let enriched: Vec<EnrichedItem> = items
            .into_iter()
            .zip(translations)
            .map(|(item, translation)| self.enrich(item, translation))
            .collect();
        let unknown = unknown_region(&self.target_lang);
        let unmatched = enriched.iter().filter(|i| i.country == unknown).count();
        info!(items = enriched.len(), unmatched, "Enriched items");
        enriched
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
