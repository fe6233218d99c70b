//! Testing utilities and mock implementations.
//!
//! Mocks for every seam of the refresh pipeline, so a full run can be driven
//! without network access or a database file.
//!
//! # Example
//!
//! ```rust,ignore
//! use cachewarm_core::testing::{fixtures, MemoryCache, MockResponse, MockScraperFactory, MockWatchlist};
//!
//! let yts = MockScraperFactory::new("yts");
//! yts.scraper().set_default(MockResponse::Results(vec![
//!     fixtures::source_record("yts", "Dune.2021.1080p", "abc123"),
//! ]));
//!
//! let watchlist = MockWatchlist::with_items(vec![fixtures::watchlist_item("Dune", 2021, "tt1160419")]);
//! let cache = MemoryCache::new();
//! ```

mod memory_cache;
mod mock_scraper;
mod mock_watchlist;

pub use memory_cache::MemoryCache;
pub use mock_scraper::{MockResponse, MockScraper, MockScraperFactory, RecordedCall};
pub use mock_watchlist::MockWatchlist;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::scraper::SourceRecord;

    /// Create a test source record with reasonable defaults.
    pub fn source_record(indexer: &str, title: &str, info_hash: &str) -> SourceRecord {
        SourceRecord {
            release_title: title.to_string(),
            info_hash: info_hash.to_string(),
            magnet_uri: Some(format!("magnet:?xt=urn:btih:{}", info_hash)),
            size_bytes: 1024 * 1024 * 1024 * 4, // 4 GB
            seeders: 50,
            package: "single".to_string(),
            indexer: indexer.to_string(),
        }
    }

    /// Create a well-formed watchlist item.
    pub fn watchlist_item(title: &str, year: i64, imdb_id: &str) -> Value {
        json!({
            "rank": 1,
            "listed_at": "2024-01-01T00:00:00.000Z",
            "type": "movie",
            "movie": {
                "title": title,
                "year": year,
                "ids": {
                    "trakt": 1,
                    "slug": title.to_lowercase().replace(' ', "-"),
                    "imdb": imdb_id,
                    "tmdb": 1
                }
            }
        })
    }
}
