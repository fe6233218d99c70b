use super::{BySource, CacheError, SourceCache};

/// Stands in for a cache that could not be opened. Every write fails with
/// the open error, so each movie is reported as failed and the run goes on.
#[derive(Debug, Clone)]
pub struct UnavailableCache {
    reason: String,
}

impl UnavailableCache {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SourceCache for UnavailableCache {
    fn set(&self, key: &str, _value: &BySource) -> Result<(), CacheError> {
        Err(CacheError::Database(format!(
            "cache unavailable, cannot store {}: {}",
            key, self.reason
        )))
    }
}
