use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachewarm_core::{
    jackett_factories, load_config_from_env, metrics, validate_config, RefreshPipeline,
    SanitizedConfig, ScraperRegistry, SourceCache, SqliteSourceCache, TraktWatchlistClient,
    UnavailableCache, WatchlistSource,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set to `json` for one JSON object per log line.
const LOG_FORMAT_VAR: &str = "CACHEWARM_LOG_FORMAT";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var(LOG_FORMAT_VAR).is_ok_and(|format| format == "json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("cachewarm {}", VERSION);

    // Load configuration
    let config = load_config_from_env().context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        "Configuration: {}",
        serde_json::to_string(&sanitized).unwrap_or_default()
    );

    // Watchlist client
    let watchlist: Arc<dyn WatchlistSource> = Arc::new(
        TraktWatchlistClient::new(&config.watchlist, &config.http)
            .context("Failed to create watchlist client")?,
    );

    // Scrapers
    let registry = match &config.scrapers.jackett {
        Some(jackett_config) => {
            info!("Initializing scrapers through Jackett at {}", jackett_config.url);
            let factories =
                jackett_factories(jackett_config).context("Failed to create Jackett scrapers")?;
            ScraperRegistry::from_factories(&config.scrapers.allowed, factories)
        }
        None => {
            warn!("No scraper backend configured");
            ScraperRegistry::default()
        }
    };

    // Cache
    let cache: Arc<dyn SourceCache> = match SqliteSourceCache::new(&config.cache.path) {
        Ok(cache) => {
            info!("Cache opened at {:?}", config.cache.path);
            Arc::new(cache)
        }
        Err(e) => {
            error!("Failed to open cache at {:?}: {}", config.cache.path, e);
            Arc::new(UnavailableCache::new(e.to_string()))
        }
    };

    let pipeline = RefreshPipeline::new(watchlist, registry, cache);
    let result = pipeline.run().await;

    if let Some(path) = &config.metrics.textfile {
        match metrics::write_textfile(path) {
            Ok(()) => info!("Metrics written to {:?}", path),
            Err(e) => warn!("Failed to write metrics to {:?}: {}", path, e),
        }
    }

    let summary = result.context("Refresh failed")?;
    info!(
        "Summary: {}",
        serde_json::to_string(&summary).unwrap_or_default()
    );

    Ok(())
}
