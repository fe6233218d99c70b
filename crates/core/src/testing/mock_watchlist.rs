//! Mock watchlist source for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::watchlist::{WatchlistError, WatchlistSource};

/// Mock implementation of the WatchlistSource trait.
///
/// Returns the configured raw items, or fails once with a queued error.
#[derive(Debug, Default)]
pub struct MockWatchlist {
    items: Mutex<Vec<Value>>,
    next_error: Mutex<Option<WatchlistError>>,
    fetches: AtomicUsize,
}

impl MockWatchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Value>) -> Self {
        let watchlist = Self::new();
        watchlist.set_items(items);
        watchlist
    }

    pub fn set_items(&self, items: Vec<Value>) {
        *self.items.lock().unwrap() = items;
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&self, error: WatchlistError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatchlistSource for MockWatchlist {
    async fn fetch(&self) -> Result<Vec<Value>, WatchlistError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.items.lock().unwrap().clone())
    }
}
