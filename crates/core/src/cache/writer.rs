use std::sync::Arc;
use tracing::{debug, warn};

use crate::metrics;

use super::{BySource, SourceCache};

/// Result of one cache write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Failed(String),
}

/// Writes aggregated results to the cache without ever failing the caller.
#[derive(Clone)]
pub struct CacheWriter {
    cache: Arc<dyn SourceCache>,
}

impl CacheWriter {
    pub fn new(cache: Arc<dyn SourceCache>) -> Self {
        Self { cache }
    }

    /// Store `value` under `key`. Failures are logged with the key and
    /// reported in the outcome.
    pub fn write(&self, key: &str, value: &BySource) -> WriteOutcome {
        match self.cache.set(key, value) {
            Ok(()) => {
                debug!(key = %key, sources = value.len(), "Cached results");
                metrics::CACHE_WRITES.with_label_values(&["written"]).inc();
                WriteOutcome::Written
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Error caching results");
                metrics::CACHE_WRITES.with_label_values(&["failed"]).inc();
                WriteOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCache;

    #[test]
    fn test_write_success() {
        let cache = Arc::new(MemoryCache::new());
        let writer = CacheWriter::new(cache.clone());

        let outcome = writer.write("dune 2021", &BySource::new());
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(cache.writes().len(), 1);
        assert_eq!(cache.writes()[0].0, "dune 2021");
    }

    #[test]
    fn test_write_failure_is_reported_not_propagated() {
        let cache = Arc::new(MemoryCache::new());
        cache.fail_key("dune 2021");
        let writer = CacheWriter::new(cache.clone());

        let outcome = writer.write("dune 2021", &BySource::new());
        assert!(matches!(outcome, WriteOutcome::Failed(_)));
        assert!(cache.writes().is_empty());

        // Other keys still go through
        assert_eq!(writer.write("heat 1995", &BySource::new()), WriteOutcome::Written);
    }
}
