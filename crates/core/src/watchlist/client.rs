//! HTTP client for the Trakt-style watchlist endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{HttpConfig, WatchlistConfig};

use super::{json_type_name, preview, WatchlistError, WatchlistSource};

/// Fetches the watchlist with a single GET. No retries.
pub struct TraktWatchlistClient {
    client: Client,
    url: String,
}

impl TraktWatchlistClient {
    /// Create a new client sending the configured headers on every request.
    pub fn new(watchlist: &WatchlistConfig, http: &HttpConfig) -> Result<Self, WatchlistError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &watchlist.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                WatchlistError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| WatchlistError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs as u64))
            .default_headers(headers)
            .build()
            .map_err(|e| WatchlistError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: watchlist.url.clone(),
        })
    }
}

#[async_trait]
impl WatchlistSource for TraktWatchlistClient {
    async fn fetch(&self) -> Result<Vec<Value>, WatchlistError> {
        debug!(url = %self.url, "Fetching watchlist");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WatchlistError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchlistError::HttpStatus {
                status: status.as_u16(),
                preview: preview(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WatchlistError::Request(e.to_string()))?;

        if body.trim().is_empty() {
            return Err(WatchlistError::EmptyBody);
        }

        let parsed: Value =
            serde_json::from_str(&body).map_err(|e| WatchlistError::InvalidJson {
                status: status.as_u16(),
                reason: e.to_string(),
                preview: preview(&body),
            })?;

        match parsed {
            Value::Array(items) => {
                info!(items = items.len(), "Watchlist fetched");
                Ok(items)
            }
            other => Err(WatchlistError::UnexpectedShape {
                found: json_type_name(&other).to_string(),
                preview: preview(&body),
            }),
        }
    }
}
