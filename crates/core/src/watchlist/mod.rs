//! Watchlist retrieval.
//!
//! The watchlist is fetched once per run. Any fetch failure is fatal; items
//! that fail validation are skipped one by one.

mod client;
mod types;

pub use client::TraktWatchlistClient;
pub use types::*;
