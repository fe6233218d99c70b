//! Refresh pipeline driver.
//!
//! One run fetches the watchlist once, then walks the raw items strictly in
//! order. A watchlist failure aborts the run. Everything after that is
//! per-item: a skipped item, a failed scraper, a panic or a failed cache
//! write only affects the movie it belongs to.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{aggregate_item, panic_message};
use crate::cache::{CacheWriter, SourceCache, WriteOutcome};
use crate::metrics;
use crate::scraper::ScraperRegistry;
use crate::watchlist::{preview, SkipReason, WatchlistError, WatchlistSource};

/// Errors that abort a refresh run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch watchlist: {0}")]
    Watchlist(#[from] WatchlistError),
}

/// Result of processing one raw watchlist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieOutcome {
    /// Results written under `key` from `sources` scrapers.
    Cached { key: String, sources: usize },
    NoResults,
    Skipped(SkipReason),
    Failed(String),
}

impl MovieOutcome {
    fn label(&self) -> &'static str {
        match self {
            MovieOutcome::Cached { .. } => "cached",
            MovieOutcome::NoResults => "no_results",
            MovieOutcome::Skipped(_) => "skipped",
            MovieOutcome::Failed(_) => "failed",
        }
    }
}

/// Counts for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Raw watchlist items seen, valid or not.
    pub processed: usize,
    pub cached: usize,
    pub no_results: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RefreshSummary {
    fn record(&mut self, outcome: &MovieOutcome) {
        self.processed += 1;
        match outcome {
            MovieOutcome::Cached { .. } => self.cached += 1,
            MovieOutcome::NoResults => self.no_results += 1,
            MovieOutcome::Skipped(_) => self.skipped += 1,
            MovieOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Drives one refresh: watchlist, then per-movie aggregation and caching.
pub struct RefreshPipeline {
    watchlist: Arc<dyn WatchlistSource>,
    registry: ScraperRegistry,
    writer: CacheWriter,
}

impl RefreshPipeline {
    pub fn new(
        watchlist: Arc<dyn WatchlistSource>,
        registry: ScraperRegistry,
        cache: Arc<dyn SourceCache>,
    ) -> Self {
        Self {
            watchlist,
            registry,
            writer: CacheWriter::new(cache),
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    /// Run one refresh.
    ///
    /// Only a watchlist failure is returned as an error. Per-movie problems
    /// are counted in the summary.
    pub async fn run(&self) -> Result<RefreshSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        self.run_inner()
            .instrument(info_span!("refresh", run_id = %run_id))
            .await
    }

    async fn run_inner(&self) -> Result<RefreshSummary, PipelineError> {
        info!(scrapers = ?self.registry.names(), "Starting refresh");
        if self.registry.is_empty() {
            warn!("No scrapers registered, nothing will be cached");
        }

        let items = self.watchlist.fetch().await?;
        metrics::WATCHLIST_ITEMS.inc_by(items.len() as u64);

        let mut summary = RefreshSummary::default();
        for raw in &items {
            let outcome = self.process_item(raw).await;
            metrics::MOVIE_OUTCOMES
                .with_label_values(&[outcome.label()])
                .inc();
            summary.record(&outcome);
        }

        info!(
            cached = summary.cached,
            no_results = summary.no_results,
            skipped = summary.skipped,
            failed = summary.failed,
            "Successfully processed {} movies",
            summary.processed
        );
        Ok(summary)
    }

    /// Process one raw item. Never fails; a panic becomes `Failed`.
    pub async fn process_item(&self, raw: &Value) -> MovieOutcome {
        match AssertUnwindSafe(self.process_item_inner(raw))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(error = %reason, "Error processing movie result");
                MovieOutcome::Failed(reason)
            }
        }
    }

    async fn process_item_inner(&self, raw: &Value) -> MovieOutcome {
        let (movie, aggregate) = match aggregate_item(raw, &self.registry).await {
            Ok(aggregated) => aggregated,
            Err(reason) => {
                warn!(reason = %reason, item = %preview(&raw.to_string()), "Skipping invalid movie result");
                return MovieOutcome::Skipped(reason);
            }
        };

        let Some(entry) = aggregate.entry else {
            debug!(movie = %movie.title, year = movie.year, "No results from any scraper");
            return MovieOutcome::NoResults;
        };

        match self.writer.write(&entry.canonical_query, &entry.by_source) {
            WriteOutcome::Written => {
                info!(
                    movie = %movie.title,
                    key = %entry.canonical_query,
                    sources = entry.by_source.len(),
                    "Cached results"
                );
                MovieOutcome::Cached {
                    key: entry.canonical_query,
                    sources: entry.by_source.len(),
                }
            }
            WriteOutcome::Failed(reason) => MovieOutcome::Failed(format!(
                "cache write for {} failed: {}",
                entry.canonical_query, reason
            )),
        }
    }
}
