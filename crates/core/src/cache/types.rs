//! Types for the source cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::scraper::SourceRecord;

/// Results per scraper name, as stored under one cache key.
pub type BySource = BTreeMap<String, Vec<SourceRecord>>;

/// A cached entry, as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSources {
    /// Canonical query the entry is keyed by.
    pub key: String,
    pub by_source: BySource,
    /// When first written.
    pub created_at: DateTime<Utc>,
    /// When last refreshed.
    pub updated_at: DateTime<Utc>,
}

/// Errors for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Key-value store for aggregated scraper results.
pub trait SourceCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: &BySource) -> Result<(), CacheError>;
}
