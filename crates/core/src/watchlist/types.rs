//! Types for watchlist retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Number of response characters kept in diagnostics.
pub const PREVIEW_CHARS: usize = 500;

/// One movie from the watchlist, validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub title: String,
    pub year: i64,
    pub imdb_id: String,
}

/// Why a raw watchlist item was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("item has no movie object")]
    MissingMovie,

    #[error("movie is missing {0}")]
    MissingFields(String),

    #[error("movie has no IMDB id")]
    MissingImdbId,
}

/// Errors fetching the watchlist. All are fatal for a run.
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Error making API request: {0}")]
    Request(String),

    #[error("Invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("API returned HTTP {status}: {preview}")]
    HttpStatus { status: u16, preview: String },

    #[error("API returned empty response")]
    EmptyBody,

    #[error("Error parsing JSON response (HTTP {status}): {reason}; response content: {preview}...")]
    InvalidJson {
        status: u16,
        reason: String,
        preview: String,
    },

    #[error("Expected list from API, got {found}; response content: {preview}...")]
    UnexpectedShape { found: String, preview: String },
}

/// Source of raw watchlist items.
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    /// Fetch the whole watchlist as raw items.
    async fn fetch(&self) -> Result<Vec<Value>, WatchlistError>;
}

/// Validate a raw item shaped `{ movie: { title, year, ids: { imdb } } }`.
pub fn parse_entry(raw: &Value) -> Result<WatchlistEntry, SkipReason> {
    let movie = raw
        .get("movie")
        .filter(|m| m.is_object())
        .ok_or(SkipReason::MissingMovie)?;

    let missing: Vec<&str> = ["title", "year", "ids"]
        .into_iter()
        .filter(|key| movie.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(SkipReason::MissingFields(missing.join(", ")));
    }

    let title = movie["title"]
        .as_str()
        .ok_or_else(|| SkipReason::MissingFields("title".to_string()))?;
    let year = movie["year"]
        .as_i64()
        .ok_or_else(|| SkipReason::MissingFields("year".to_string()))?;
    let imdb_id = movie["ids"]
        .get("imdb")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(SkipReason::MissingImdbId)?;

    Ok(WatchlistEntry {
        title: title.to_string(),
        year,
        imdb_id: imdb_id.to_string(),
    })
}

/// Name of a JSON value's type, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First [`PREVIEW_CHARS`] characters of a response body.
pub fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_entry() {
        let raw = json!({
            "rank": 1,
            "movie": {
                "title": "Dune",
                "year": 2021,
                "ids": { "trakt": 287071, "imdb": "tt1160419", "tmdb": 438631 }
            }
        });
        let entry = parse_entry(&raw).unwrap();
        assert_eq!(entry.title, "Dune");
        assert_eq!(entry.year, 2021);
        assert_eq!(entry.imdb_id, "tt1160419");
    }

    #[test]
    fn test_parse_missing_movie() {
        assert_eq!(
            parse_entry(&json!({ "show": { "title": "Severance" } })),
            Err(SkipReason::MissingMovie)
        );
        assert_eq!(parse_entry(&json!("movie")), Err(SkipReason::MissingMovie));
    }

    #[test]
    fn test_parse_missing_fields() {
        let raw = json!({ "movie": { "title": "Dune", "ids": { "imdb": "tt1160419" } } });
        assert_eq!(
            parse_entry(&raw),
            Err(SkipReason::MissingFields("year".to_string()))
        );

        let raw = json!({ "movie": { "year": 2021 } });
        assert_eq!(
            parse_entry(&raw),
            Err(SkipReason::MissingFields("title, ids".to_string()))
        );
    }

    #[test]
    fn test_parse_null_year_is_missing() {
        let raw = json!({ "movie": { "title": "Untitled", "year": null, "ids": { "imdb": "tt0" } } });
        assert!(matches!(parse_entry(&raw), Err(SkipReason::MissingFields(_))));
    }

    #[test]
    fn test_parse_missing_imdb() {
        let raw = json!({ "movie": { "title": "Dune", "year": 2021, "ids": { "tmdb": 438631 } } });
        assert_eq!(parse_entry(&raw), Err(SkipReason::MissingImdbId));

        let raw = json!({ "movie": { "title": "Dune", "year": 2021, "ids": { "imdb": null } } });
        assert_eq!(parse_entry(&raw), Err(SkipReason::MissingImdbId));
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&json!({})), "object");
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!("x")), "string");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        let body = "é".repeat(600);
        assert_eq!(preview(&body).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
