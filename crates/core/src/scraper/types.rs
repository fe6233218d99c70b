//! Types for the source scraper system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// One release returned by a scraper for a movie search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Release title as listed by the index.
    pub release_title: String,
    /// Info hash (lowercase hex).
    pub info_hash: String,
    /// Magnet URI, if the index provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Seeders reported by the index.
    pub seeders: u32,
    /// Release packaging ("single" for a movie).
    pub package: String,
    /// Which index returned this result.
    pub indexer: String,
}

/// What a scraper produced for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScraperOutcome {
    /// The scraper legitimately found nothing. Contributes no data.
    NoResult,
    /// The scraper found releases for the query it derived.
    Results {
        /// Normalized query string the scraper searched with.
        canonical_query: String,
        items: Vec<SourceRecord>,
    },
}

impl ScraperOutcome {
    pub fn is_no_result(&self) -> bool {
        matches!(self, ScraperOutcome::NoResult)
    }
}

/// Errors that can occur during scraper operations.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Scraper backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Scraper backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to construct scraper {name}: {reason}")]
    Construction { name: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A source scraper bound to one content index.
///
/// Instances are built once per run and reused for every movie; any session
/// state they keep is their own business.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scraper name, used as the key in aggregated results.
    fn name(&self) -> &str;

    /// Search for a movie by title, year and IMDB id.
    async fn movie(
        &self,
        title: &str,
        year: &str,
        imdb_id: &str,
    ) -> Result<ScraperOutcome, ScraperError>;
}

/// Builds a [`Scraper`]. One factory per scraper name a backend can serve.
pub trait ScraperFactory: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self) -> Result<Arc<dyn Scraper>, ScraperError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_record_serialization() {
        let record = SourceRecord {
            release_title: "Dune.2021.1080p.WEBRip".to_string(),
            info_hash: "abc123".to_string(),
            magnet_uri: None,
            size_bytes: 2048,
            seeders: 12,
            package: "single".to_string(),
            indexer: "yts".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("magnet_uri")); // None should be skipped

        let parsed: SourceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_outcome_no_result() {
        assert!(ScraperOutcome::NoResult.is_no_result());
        let outcome = ScraperOutcome::Results {
            canonical_query: "dune 2021".to_string(),
            items: vec![],
        };
        assert!(!outcome.is_no_result());
    }
}
