pub mod aggregate;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod scraper;
pub mod testing;
pub mod watchlist;

pub use aggregate::{aggregate, aggregate_item, AggregatedEntry, MovieAggregate, ScrapeAttempt};
pub use cache::{
    BySource, CacheError, CacheWriter, CachedSources, SourceCache, SqliteSourceCache, UnavailableCache,
    WriteOutcome,
};
pub use config::{
    load_config_from_env, resolve_config, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use pipeline::{MovieOutcome, PipelineError, RefreshPipeline, RefreshSummary};
pub use scraper::{
    canonical_movie_query, jackett_factories, Scraper, ScraperError, ScraperFactory,
    ScraperOutcome, ScraperRegistry, SourceRecord,
};
pub use watchlist::{
    parse_entry, SkipReason, TraktWatchlistClient, WatchlistEntry, WatchlistError,
    WatchlistSource,
};
