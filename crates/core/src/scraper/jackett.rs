//! Jackett-backed scrapers.
//!
//! Each scraper name is served by one Jackett indexer. Jackett does the
//! actual index scraping; this adapter only issues the movie search and maps
//! the results.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::JackettConfig;

use super::query::canonical_movie_query;
use super::{Scraper, ScraperError, ScraperFactory, ScraperOutcome, SourceRecord};

/// Scraper names the Jackett adapter can serve out of the box.
pub const JACKETT_SCRAPERS: &[&str] = &[
    "bitsearch",
    "btdig",
    "glodls",
    "kickass",
    "limetorrents",
    "magnetdl",
    "nyaa",
    "piratebay",
    "torrentgalaxy",
    "torrentio",
    "torrentz2",
    "yts",
];

/// Jackett category id for movies.
const MOVIES_CATEGORY: i32 = 2000;

static BTIH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"urn:btih:([A-Fa-f0-9]{40}|[A-Za-z2-7]{32})").unwrap());

/// Build one factory per scraper name Jackett can serve: the built-in set
/// plus any name given an explicit indexer id.
pub fn jackett_factories(
    config: &JackettConfig,
) -> Result<Vec<Box<dyn ScraperFactory>>, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs as u64))
        .build()
        .map_err(|e| ScraperError::Construction {
            name: "jackett".to_string(),
            reason: e.to_string(),
        })?;
    let config = Arc::new(config.clone());

    let mut names: Vec<String> = JACKETT_SCRAPERS.iter().map(|n| n.to_string()).collect();
    for name in config.indexer_ids.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    Ok(names
        .into_iter()
        .map(|name| {
            Box::new(JackettScraperFactory {
                name,
                client: client.clone(),
                config: Arc::clone(&config),
            }) as Box<dyn ScraperFactory>
        })
        .collect())
}

/// Factory for a single Jackett-backed scraper.
pub struct JackettScraperFactory {
    name: String,
    client: Client,
    config: Arc<JackettConfig>,
}

impl ScraperFactory for JackettScraperFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<Arc<dyn Scraper>, ScraperError> {
        if self.config.url.is_empty() {
            return Err(ScraperError::Construction {
                name: self.name.clone(),
                reason: "Jackett URL is empty".to_string(),
            });
        }
        Ok(Arc::new(JackettScraper {
            name: self.name.clone(),
            indexer: self.config.indexer_id(&self.name).to_string(),
            client: self.client.clone(),
            config: Arc::clone(&self.config),
        }))
    }
}

/// Scraper that searches one Jackett indexer.
pub struct JackettScraper {
    name: String,
    indexer: String,
    client: Client,
    config: Arc<JackettConfig>,
}

impl JackettScraper {
    /// Build the Jackett API URL for a movie search.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}&Category[]={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.indexer),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query),
            MOVIES_CATEGORY
        )
    }
}

#[async_trait]
impl Scraper for JackettScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn movie(
        &self,
        title: &str,
        year: &str,
        imdb_id: &str,
    ) -> Result<ScraperOutcome, ScraperError> {
        let query = format!("{} {}", title, year);
        let url = self.build_search_url(&query);
        debug!(indexer = %self.indexer, imdb = %imdb_id, query = %query, "Searching Jackett");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::Timeout
            } else if e.is_connect() {
                ScraperError::ConnectionFailed(e.to_string())
            } else {
                ScraperError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| ScraperError::ApiError(format!("Failed to parse response: {}", e)))?;

        let items = to_source_records(&self.name, jackett_response.Results);
        debug!(indexer = %self.indexer, results = items.len(), "Jackett search complete");

        if items.is_empty() {
            return Ok(ScraperOutcome::NoResult);
        }

        Ok(ScraperOutcome::Results {
            canonical_query: canonical_movie_query(title, year),
            items,
        })
    }
}

/// Map Jackett results to source records, dropping any without a usable hash.
fn to_source_records(scraper: &str, results: Vec<JackettResult>) -> Vec<SourceRecord> {
    results
        .into_iter()
        .filter_map(|r| {
            let info_hash = r
                .InfoHash
                .filter(|h| !h.is_empty())
                .or_else(|| r.MagnetUri.as_deref().and_then(hash_from_magnet))?
                .to_lowercase();
            Some(SourceRecord {
                release_title: r.Title,
                info_hash,
                magnet_uri: r.MagnetUri,
                size_bytes: r.Size.unwrap_or(0).max(0) as u64,
                seeders: r.Seeders.unwrap_or(0).max(0) as u32,
                package: "single".to_string(),
                indexer: scraper.to_string(),
            })
        })
        .collect()
}

fn hash_from_magnet(magnet: &str) -> Option<String> {
    BTIH.captures(magnet)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn config(url: &str) -> JackettConfig {
        JackettConfig {
            url: url.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            indexer_ids: BTreeMap::from([("piratebay".to_string(), "thepiratebay".to_string())]),
        }
    }

    fn scraper_named(config: &JackettConfig, name: &str) -> Arc<dyn Scraper> {
        jackett_factories(config)
            .unwrap()
            .into_iter()
            .find(|f| f.name() == name)
            .unwrap()
            .create()
            .unwrap()
    }

    fn result(title: &str, hash: Option<&str>, magnet: Option<&str>) -> JackettResult {
        JackettResult {
            Title: title.to_string(),
            MagnetUri: magnet.map(str::to_string),
            InfoHash: hash.map(str::to_string),
            Size: Some(1024),
            Seeders: Some(-1),
        }
    }

    async fn spawn_jackett(results: serde_json::Value) -> String {
        let app = Router::new().route(
            "/api/v2.0/indexers/{id}/results",
            get(move |Path(id): Path<String>| {
                let results = results.clone();
                async move {
                    if id == "emptyindexer" {
                        Json(json!({ "Results": [] }))
                    } else {
                        Json(json!({ "Results": results }))
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_build_search_url() {
        let config = config("http://localhost:9117/"); // trailing slash
        let scraper = JackettScraper {
            name: "piratebay".to_string(),
            indexer: config.indexer_id("piratebay").to_string(),
            client: Client::new(),
            config: Arc::new(config),
        };

        let url = scraper.build_search_url("Dune 2021");
        assert!(url.starts_with("http://localhost:9117/api/v2.0/indexers/thepiratebay/results"));
        assert!(url.contains("apikey=test-key"));
        assert!(url.contains("Query=Dune%202021"));
        assert!(url.contains("Category[]=2000"));
    }

    #[test]
    fn test_factories_include_custom_indexers() {
        let mut config = config("http://localhost:9117");
        config
            .indexer_ids
            .insert("rutor".to_string(), "rutor".to_string());

        let names: Vec<String> = jackett_factories(&config)
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert!(names.contains(&"yts".to_string()));
        assert!(names.contains(&"rutor".to_string()));
        assert_eq!(names.iter().filter(|n| *n == "piratebay").count(), 1);
    }

    #[test]
    fn test_factory_rejects_empty_url() {
        let factories = jackett_factories(&config("")).unwrap();
        assert!(matches!(
            factories[0].create(),
            Err(ScraperError::Construction { .. })
        ));
    }

    #[test]
    fn test_to_source_records_hash_sources() {
        let magnet = "magnet:?xt=urn:btih:ABCDEF0123456789ABCDEF0123456789ABCDEF01&dn=x";
        let records = to_source_records(
            "yts",
            vec![
                result("With Hash", Some("FFEE"), None),
                result("Magnet Only", None, Some(magnet)),
                result("Empty Hash Magnet", Some(""), Some(magnet)),
                result("Nothing", None, Some("http://example.com/file.torrent")),
            ],
        );

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].info_hash, "ffee");
        assert_eq!(
            records[1].info_hash,
            "abcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(records[1].magnet_uri.as_deref(), Some(magnet));
        assert_eq!(records[0].seeders, 0); // negative clamped
        assert_eq!(records[0].indexer, "yts");
        assert_eq!(records[0].package, "single");
    }

    #[tokio::test]
    async fn test_movie_search_returns_results() {
        let base = spawn_jackett(json!([
            { "Title": "Dune.2021.2160p", "InfoHash": "AAAA", "Size": 4096, "Seeders": 40 },
            { "Title": "Dune.2021.1080p", "InfoHash": "BBBB", "Size": 2048, "Seeders": 20 }
        ]))
        .await;

        let scraper = scraper_named(&config(&base), "yts");
        let outcome = scraper.movie("Dune", "2021", "tt1160419").await.unwrap();

        match outcome {
            ScraperOutcome::Results {
                canonical_query,
                items,
            } => {
                assert_eq!(canonical_query, "dune 2021");
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].info_hash, "aaaa");
            }
            ScraperOutcome::NoResult => panic!("expected results"),
        }
    }

    #[tokio::test]
    async fn test_movie_search_no_results() {
        let base = spawn_jackett(json!([])).await;
        let mut config = config(&base);
        config
            .indexer_ids
            .insert("nyaa".to_string(), "emptyindexer".to_string());

        let scraper = scraper_named(&config, "nyaa");
        let outcome = scraper.movie("Dune", "2021", "tt1160419").await.unwrap();
        assert!(outcome.is_no_result());
    }

    #[tokio::test]
    async fn test_movie_search_connection_failure() {
        // Nothing listens on port 1
        let scraper = scraper_named(&config("http://127.0.0.1:1"), "yts");
        let result = scraper.movie("Dune", "2021", "tt1160419").await;
        assert!(result.is_err());
    }
}
