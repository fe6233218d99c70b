//! Per-movie fan-out over the scraper registry.
//!
//! Every registered scraper is called in turn for one movie. Each call is
//! its own failure boundary: an error or a panic from one scraper is logged
//! and recorded, and the remaining scrapers still run.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::BySource;
use crate::metrics;
use crate::scraper::{Scraper, ScraperOutcome, ScraperRegistry};
use crate::watchlist::{parse_entry, SkipReason, WatchlistEntry};

/// Results for one movie, ready to be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedEntry {
    /// Cache key: the canonical query of the last contributing scraper.
    pub canonical_query: String,
    /// Items per contributing scraper.
    pub by_source: BySource,
}

/// What happened when one scraper was asked about one movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeAttempt {
    Contributed { scraper: String, items: usize },
    NoResult { scraper: String },
    Failed { scraper: String, reason: String },
}

/// Aggregation of every scraper's answer for one movie.
#[derive(Debug, Clone, Default)]
pub struct MovieAggregate {
    /// Present iff at least one scraper contributed and a non-empty
    /// canonical query was captured.
    pub entry: Option<AggregatedEntry>,
    /// One attempt per registered scraper, in registry order.
    pub attempts: Vec<ScrapeAttempt>,
}

impl MovieAggregate {
    pub fn failed_scrapers(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| match a {
                ScrapeAttempt::Failed { scraper, .. } => Some(scraper.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Validate a raw watchlist item, then aggregate it.
///
/// Invalid items are returned as the skip reason and never reach a scraper.
pub async fn aggregate_item(
    raw: &Value,
    registry: &ScraperRegistry,
) -> Result<(WatchlistEntry, MovieAggregate), SkipReason> {
    let movie = parse_entry(raw)?;
    let aggregate = aggregate(&movie, registry).await;
    Ok((movie, aggregate))
}

/// Ask every registered scraper about `movie` and collect the answers.
///
/// `NoResult` answers contribute nothing. Each contributing scraper
/// overwrites the running canonical query, so the key belongs to the last
/// contributor in registry order.
pub async fn aggregate(movie: &WatchlistEntry, registry: &ScraperRegistry) -> MovieAggregate {
    let year = movie.year.to_string();
    let mut by_source = BySource::new();
    let mut canonical_query: Option<String> = None;
    let mut attempts = Vec::with_capacity(registry.len());

    for scraper in registry.iter() {
        let name = scraper.name().to_string();
        let started = Instant::now();
        let result = call_scraper(scraper.as_ref(), movie, &year).await;
        metrics::SCRAPER_DURATION
            .with_label_values(&[&name])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(ScraperOutcome::Results {
                canonical_query: query,
                items,
            }) => {
                debug!(scraper = %name, movie = %movie.title, items = items.len(), "Scraper returned results");
                metrics::SCRAPER_CALLS
                    .with_label_values(&[&name, "results"])
                    .inc();
                attempts.push(ScrapeAttempt::Contributed {
                    scraper: name.clone(),
                    items: items.len(),
                });
                canonical_query = Some(query);
                by_source.insert(name, items);
            }
            Ok(ScraperOutcome::NoResult) => {
                debug!(scraper = %name, movie = %movie.title, "Scraper found nothing");
                metrics::SCRAPER_CALLS
                    .with_label_values(&[&name, "no_result"])
                    .inc();
                attempts.push(ScrapeAttempt::NoResult { scraper: name });
            }
            Err(reason) => {
                warn!(scraper = %name, movie = %movie.title, error = %reason, "Error with scraper");
                metrics::SCRAPER_CALLS
                    .with_label_values(&[&name, "failed"])
                    .inc();
                attempts.push(ScrapeAttempt::Failed {
                    scraper: name,
                    reason,
                });
            }
        }
    }

    let entry = match canonical_query {
        Some(query) if !query.is_empty() && !by_source.is_empty() => Some(AggregatedEntry {
            canonical_query: query,
            by_source,
        }),
        _ => None,
    };

    MovieAggregate { entry, attempts }
}

async fn call_scraper(
    scraper: &dyn Scraper,
    movie: &WatchlistEntry,
    year: &str,
) -> Result<ScraperOutcome, String> {
    let call = AssertUnwindSafe(scraper.movie(&movie.title, year, &movie.imdb_id)).catch_unwind();
    match call.await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("scraper panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
