use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::scraper::DEFAULT_ALLOWED_SCRAPERS;

/// Root configuration, resolved once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub watchlist: WatchlistConfig,
    /// Overrides parsed from `A4KSCRAPERS_ENV`, already layered over the environment.
    #[serde(default)]
    pub env_overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scrapers: ScrapersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Watchlist endpoint and the headers sent with the request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchlistConfig {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// Settings resolved through figment: defaults, optional TOML file, then
/// `CACHEWARM_*` variables from the layered environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scrapers: ScrapersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Outbound HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

/// Source cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cachewarm.db")
}

/// Scraper selection and backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapersConfig {
    /// Scraper names vetted for batch use.
    #[serde(default = "default_allowed")]
    pub allowed: Vec<String>,
    /// Jackett backend serving the scrapers (one indexer per scraper name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jackett: Option<JackettConfig>,
}

impl Default for ScrapersConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed(),
            jackett: None,
        }
    }
}

fn default_allowed() -> Vec<String> {
    DEFAULT_ALLOWED_SCRAPERS
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Jackett backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Scraper name -> Jackett indexer id, for names that differ.
    #[serde(default)]
    pub indexer_ids: BTreeMap<String, String>,
}

impl JackettConfig {
    /// Jackett indexer id serving the given scraper name.
    pub fn indexer_id<'a>(&'a self, scraper: &'a str) -> &'a str {
        self.indexer_ids
            .get(scraper)
            .map(String::as_str)
            .unwrap_or(scraper)
    }
}

/// Metrics output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Where to write the Prometheus text exposition after a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textfile: Option<PathBuf>,
}

/// Sanitized config for logging (header values and secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub watchlist_url: String,
    pub header_names: Vec<String>,
    pub env_override_keys: Vec<String>,
    pub timeout_secs: u32,
    pub cache: CacheConfig,
    pub allowed_scrapers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jackett: Option<SanitizedJackettConfig>,
    pub metrics: MetricsConfig,
}

/// Sanitized Jackett config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJackettConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            watchlist_url: config.watchlist.url.clone(),
            header_names: config.watchlist.headers.keys().cloned().collect(),
            env_override_keys: config.env_overrides.keys().cloned().collect(),
            timeout_secs: config.http.timeout_secs,
            cache: config.cache.clone(),
            allowed_scrapers: config.scrapers.allowed.clone(),
            jackett: config
                .scrapers
                .jackett
                .as_ref()
                .map(|j| SanitizedJackettConfig {
                    url: j.url.clone(),
                    api_key_configured: !j.api_key.is_empty(),
                    timeout_secs: j.timeout_secs,
                }),
            metrics: config.metrics.clone(),
        }
    }
}
