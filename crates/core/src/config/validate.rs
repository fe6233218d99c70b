use reqwest::Url;

use super::{types::Config, ConfigError};
use crate::scraper::DEFAULT_ALLOWED_SCRAPERS;

/// Validate configuration
/// Currently validates:
/// - Watchlist URL is an absolute http(s) URL
/// - Timeouts are not 0
/// - Jackett URL, when configured, is an absolute http(s) URL
/// - The scraper allow-list only names vetted scrapers
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    check_http_url("watchlist url", &config.watchlist.url)?;

    let unvetted: Vec<&str> = config
        .scrapers
        .allowed
        .iter()
        .map(String::as_str)
        .filter(|name| !DEFAULT_ALLOWED_SCRAPERS.contains(name))
        .collect();
    if !unvetted.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "scrapers.allowed contains scrapers not vetted for batch use: {}",
            unvetted.join(", ")
        )));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(jackett) = &config.scrapers.jackett {
        check_http_url("scrapers.jackett.url", &jackett.url)?;
        if jackett.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "scrapers.jackett.timeout_secs cannot be 0".to_string(),
            ));
        }
    }

    Ok(())
}

fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{} is invalid: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}
