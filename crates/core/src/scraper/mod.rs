//! Source scrapers.
//!
//! This module provides the `Scraper` trait for searching one content index
//! for a movie, the allow-listed registry of scrapers used by a refresh run,
//! and a Jackett-backed implementation.

mod jackett;
mod query;
mod registry;
mod types;

pub use jackett::{jackett_factories, JackettScraper, JackettScraperFactory, JACKETT_SCRAPERS};
pub use query::canonical_movie_query;
pub use registry::{ScraperRegistry, DEFAULT_ALLOWED_SCRAPERS};
pub use types::*;
