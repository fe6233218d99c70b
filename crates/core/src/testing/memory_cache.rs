//! In-memory source cache for testing.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::cache::{BySource, CacheError, SourceCache};

/// Records every write in order. Keys registered with
/// [`MemoryCache::fail_key`] are rejected with a database error.
#[derive(Debug, Default)]
pub struct MemoryCache {
    writes: Mutex<Vec<(String, BySource)>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> Vec<(String, BySource)> {
        self.writes.lock().unwrap().clone()
    }

    /// Latest value written under `key`.
    pub fn get(&self, key: &str) -> Option<BySource> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }
}

impl SourceCache for MemoryCache {
    fn set(&self, key: &str, value: &BySource) -> Result<(), CacheError> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(CacheError::Database(format!("disk I/O error writing {}", key)));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        Ok(())
    }
}
