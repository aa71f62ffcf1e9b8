//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: assembles the [`crate::models::FeedDocument`] and writes it as
//!   `docs/feed.json` for the static front-end
//!
//! # Output Structure
//!
//! ```text
//! docs/
//! └── feed.json   # {generated_at, target_lang, count, items[≤1000]}
//! ```

pub mod json;
