//! Source cache - aggregated scraper results keyed by canonical query.
//!
//! Later lookups consult the cache before hitting scrapers again. The
//! refresh pipeline only ever writes to it.

mod sqlite;
mod types;
mod unavailable;
mod writer;

pub use sqlite::SqliteSourceCache;
pub use types::*;
pub use unavailable::UnavailableCache;
pub use writer::{CacheWriter, WriteOutcome};
