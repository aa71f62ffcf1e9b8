//! Optional machine translation of titles and summaries.
//!
//! # Architecture
//!
//! - [`TranslateAsync`]: core trait for a translation backend
//! - [`LibreTranslate`]: HTTP client for a LibreTranslate-compatible endpoint
//! - [`Translator`]: wraps an optional backend with language detection, the
//!   same-language short-circuit, and the per-item pause
//!
//! # Failure Handling
//!
//! No call is retried. A failed detection means "language unknown" and a
//! failed translation returns the original text; neither stops the run.

use crate::config::TranslateConfig;
use crate::models::{NormalizedItem, Translation};
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Trait for async translation backends.
pub trait TranslateAsync {
    /// Translate `text` into `target`, letting the backend detect the source.
    async fn translate(&self, text: &str, target: &str) -> Result<String, Box<dyn Error>>;
}

/// Client for the LibreTranslate `/translate` endpoint.
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl LibreTranslate {
    pub fn new(config: &TranslateConfig) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/translate", config.base_url),
            api_key: config.api_key.clone(),
        })
    }
}

impl TranslateAsync for LibreTranslate {
    #[instrument(level = "debug", skip_all, fields(%target, chars = text.chars().count()))]
    async fn translate(&self, text: &str, target: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = TranslateRequest {
            q: text,
            source: "auto",
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("translation endpoint returned {status}").into());
        }
        let parsed: TranslateResponse = resp.json().await?;
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Translation call succeeded");
        Ok(parsed.translated_text)
    }
}

/// Detect the language of `text` as an ISO 639-1 code where one exists.
///
/// Falls back to the ISO 639-3 code for languages without a two-letter code.
pub fn detect_language(text: &str) -> Option<String> {
    let info = whatlang::detect(text)?;
    let code = info.lang().code();
    Some(iso_639_1(code).unwrap_or(code).to_string())
}

fn iso_639_1(code: &str) -> Option<&'static str> {
    Some(match code {
        "afr" => "af",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jpn" => "ja",
        "kat" => "ka",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mkd" => "mk",
        "nld" => "nl",
        "nob" => "no",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "slk" => "sk",
        "slv" => "sl",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tgl" => "tl",
        "tha" => "th",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "vie" => "vi",
        _ => return None,
    })
}

/// Translation stage: an optional backend plus the run's target language.
#[derive(Debug)]
pub struct Translator<T> {
    backend: Option<T>,
    target_lang: String,
    pause: Duration,
}

impl Translator<LibreTranslate> {
    /// Build the stage from the run configuration; `None` disables it.
    pub fn from_config(
        config: Option<&TranslateConfig>,
        target_lang: &str,
    ) -> Result<Self, Box<dyn Error>> {
        match config {
            Some(c) => Ok(Translator::new(LibreTranslate::new(c)?, target_lang, c.pause)),
            None => Ok(Translator::disabled(target_lang)),
        }
    }
}

impl<T> Translator<T>
where
    T: TranslateAsync,
{
    pub fn new(backend: T, target_lang: &str, pause: Duration) -> Self {
        Self {
            backend: Some(backend),
            target_lang: target_lang.to_string(),
            pause,
        }
    }

    pub fn disabled(target_lang: &str) -> Self {
        Self {
            backend: None,
            target_lang: target_lang.to_string(),
            pause: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Translate one text field.
    ///
    /// Returns the (possibly unchanged) text and the detected source language.
    /// `src_hint` replaces detection when given.
    pub async fn maybe_translate(&self, text: &str, src_hint: Option<&str>) -> (String, Option<String>) {
        let Some(backend) = self.backend.as_ref() else {
            return (text.to_string(), None);
        };
        if text.is_empty() {
            return (text.to_string(), None);
        }

        let lang = match src_hint {
            Some(hint) => Some(hint.to_string()),
            None => {
                let detected = detect_language(text);
                if detected.is_none() {
                    warn!(text = %truncate_for_log(text, 60), "Language detection failed");
                }
                detected
            }
        };
        if lang.as_deref() == Some(self.target_lang.as_str()) {
            return (text.to_string(), lang);
        }

        match backend.translate(text, &self.target_lang).await {
            Ok(translated) => (translated, lang),
            Err(e) => {
                warn!(error = %e, text = %truncate_for_log(text, 60), "Translation failed; keeping original");
                (text.to_string(), lang)
            }
        }
    }

    /// Translate an item's title, then its summary with the title's language
    /// as the hint.
    pub async fn translate_item(&self, item: &NormalizedItem) -> Translation {
        let (title, lang_title) = self.maybe_translate(&item.title, None).await;
        let (summary, lang_summary) = self
            .maybe_translate(&item.summary, lang_title.as_deref())
            .await;
        Translation {
            title,
            summary,
            lang: lang_title.or(lang_summary),
        }
    }

    /// Translate all items in order, pausing after each one when enabled.
    #[instrument(level = "info", skip_all, fields(items = items.len(), enabled = self.is_enabled()))]
    pub async fn translate_all(&self, items: &[NormalizedItem]) -> Vec<Translation> {
        if !self.is_enabled() {
            return items.iter().map(Translation::untranslated).collect();
        }

        let t0 = Instant::now();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.translate_item(item).await);
            sleep(self.pause).await;
        }
        info!(
            items = out.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Translated items"
        );
        out
    }
}
