//! Prometheus metrics for a refresh run.
//!
//! This module provides metrics for:
//! - Scraper calls (per scraper, by outcome)
//! - Movie outcomes
//! - Cache writes
//!
//! A batch run has no scrape endpoint, so the registry is rendered in the
//! text exposition format and written to a file for a textfile collector.

use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// =============================================================================
// Scraper Metrics
// =============================================================================

/// Scraper calls total by scraper and result.
pub static SCRAPER_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarm_scraper_calls_total", "Total scraper calls"),
        &["scraper", "result"], // "results", "no_result", "failed"
    )
    .unwrap()
});

/// Scraper call duration in seconds.
pub static SCRAPER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cachewarm_scraper_duration_seconds",
            "Duration of scraper calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["scraper"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Watchlist items seen.
pub static WATCHLIST_ITEMS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cachewarm_watchlist_items_total",
        "Total watchlist items processed",
    )
    .unwrap()
});

/// Movie outcomes total.
pub static MOVIE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarm_movie_outcomes_total", "Total movies by outcome"),
        &["outcome"], // "cached", "no_results", "skipped", "failed"
    )
    .unwrap()
});

/// Cache writes total.
pub static CACHE_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarm_cache_writes_total", "Total cache writes"),
        &["result"], // "written", "failed"
    )
    .unwrap()
});

/// Registry holding every metric above.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SCRAPER_CALLS.clone()),
        Box::new(SCRAPER_DURATION.clone()),
        Box::new(WATCHLIST_ITEMS.clone()),
        Box::new(MOVIE_OUTCOMES.clone()),
        Box::new(CACHE_WRITES.clone()),
    ]
}

/// Render all metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Write rendered metrics to `path`, replacing it atomically.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let rendered = encode_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, rendered)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        SCRAPER_CALLS.with_label_values(&["yts", "results"]).inc();
        let output = encode_metrics().unwrap();
        assert!(output.contains("cachewarm_scraper_calls_total"));
        assert!(output.contains("scraper=\"yts\""));
    }

    #[test]
    fn test_write_textfile() {
        WATCHLIST_ITEMS.inc();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cachewarm.prom");

        write_textfile(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("cachewarm_watchlist_items_total"));
        assert!(!dir.path().join("cachewarm.prom.tmp").exists());
    }
}
