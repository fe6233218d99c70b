//! SQLite-backed source cache implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{BySource, CacheError, CachedSources, SourceCache};

/// SQLite-backed source cache.
///
/// Rows are keyed by the SHA-256 of the cache key; the key text is kept
/// alongside for inspection.
pub struct SqliteSourceCache {
    conn: Mutex<Connection>,
}

impl SqliteSourceCache {
    /// Open the cache, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS source_cache (
                key_hash TEXT PRIMARY KEY,
                cache_key TEXT NOT NULL,
                value TEXT NOT NULL,
                source_count INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_source_cache_updated ON source_cache(updated_at);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Internal("cache connection lock poisoned".to_string()))
    }

    /// Look up an entry by cache key.
    pub fn get(&self, key: &str) -> Result<Option<CachedSources>, CacheError> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT cache_key, value, created_at, updated_at FROM source_cache WHERE key_hash = ?",
                params![key_hash(key)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let Some((key, value, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let by_source: BySource =
            serde_json::from_str(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        Ok(Some(CachedSources {
            key,
            by_source,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        }))
    }

    /// Number of cached entries.
    pub fn len(&self) -> Result<u64, CacheError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM source_cache", [], |row| row.get(0))
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl SourceCache for SqliteSourceCache {
    fn set(&self, key: &str, value: &BySource) -> Result<(), CacheError> {
        let json =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let now_str = Utc::now().to_rfc3339();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO source_cache (key_hash, cache_key, value, source_count, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(key_hash) DO UPDATE SET
                value = excluded.value,
                source_count = excluded.source_count,
                updated_at = excluded.updated_at",
            params![
                key_hash(key),
                key,
                json,
                value.len() as i64,
                &now_str,
                &now_str,
            ],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }
}

fn key_hash(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    fn by_source(entries: &[(&str, usize)]) -> BySource {
        entries
            .iter()
            .map(|(name, count)| {
                let items = (0..*count)
                    .map(|i| fixtures::source_record(name, &format!("Dune.2021.{}", i), &format!("{}{}", name, i)))
                    .collect();
                (name.to_string(), items)
            })
            .collect()
    }

    #[test]
    fn test_set_and_get() {
        let cache = SqliteSourceCache::in_memory().unwrap();
        let value = by_source(&[("yts", 2), ("nyaa", 1)]);

        cache.set("dune 2021", &value).unwrap();

        let cached = cache.get("dune 2021").unwrap().unwrap();
        assert_eq!(cached.key, "dune 2021");
        assert_eq!(cached.by_source, value);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let cache = SqliteSourceCache::in_memory().unwrap();
        assert!(cache.get("nothing 1999").unwrap().is_none());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_set_replaces_value() {
        let cache = SqliteSourceCache::in_memory().unwrap();
        cache.set("dune 2021", &by_source(&[("yts", 2)])).unwrap();
        let first = cache.get("dune 2021").unwrap().unwrap();

        cache.set("dune 2021", &by_source(&[("nyaa", 3)])).unwrap();
        let second = cache.get("dune 2021").unwrap().unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        assert!(!second.by_source.contains_key("yts"));
        assert_eq!(second.by_source["nyaa"].len(), 3);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sources.db");

        {
            let cache = SqliteSourceCache::new(&path).unwrap();
            cache.set("heat 1995", &by_source(&[("piratebay", 1)])).unwrap();
        }

        let cache = SqliteSourceCache::new(&path).unwrap();
        let cached = cache.get("heat 1995").unwrap().unwrap();
        assert_eq!(cached.by_source["piratebay"].len(), 1);
    }
}
