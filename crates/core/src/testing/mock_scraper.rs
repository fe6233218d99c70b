//! Mock scraper and factory for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::scraper::{
    canonical_movie_query, Scraper, ScraperError, ScraperFactory, ScraperOutcome, SourceRecord,
};

/// How a mock scraper answers a call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Results under the canonical query of the requested title and year.
    Results(Vec<SourceRecord>),
    /// Results under an explicit canonical query.
    ResultsWithQuery(String, Vec<SourceRecord>),
    NoResult,
    /// Fail with an API error carrying this message.
    Fail(String),
    /// Panic with this message.
    Panic(String),
}

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub title: String,
    pub year: String,
    pub imdb_id: String,
}

/// Mock implementation of the Scraper trait.
///
/// Answers `NoResult` unless configured otherwise. Responses can be set per
/// title or as a default, and every call is recorded.
#[derive(Debug)]
pub struct MockScraper {
    name: String,
    default_response: Mutex<MockResponse>,
    responses: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockScraper {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default_response: Mutex::new(MockResponse::NoResult),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every title without a specific response with `response`.
    pub fn set_default(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = response;
    }

    /// Answer calls for `title` with `response`.
    pub fn respond_to(&self, title: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(title.to_string(), response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn response_for(&self, title: &str) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .get(title)
            .cloned()
            .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
    }
}

#[async_trait]
impl Scraper for MockScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn movie(
        &self,
        title: &str,
        year: &str,
        imdb_id: &str,
    ) -> Result<ScraperOutcome, ScraperError> {
        self.calls.lock().unwrap().push(RecordedCall {
            title: title.to_string(),
            year: year.to_string(),
            imdb_id: imdb_id.to_string(),
        });

        match self.response_for(title) {
            MockResponse::Results(items) => Ok(ScraperOutcome::Results {
                canonical_query: canonical_movie_query(title, year),
                items,
            }),
            MockResponse::ResultsWithQuery(canonical_query, items) => Ok(ScraperOutcome::Results {
                canonical_query,
                items,
            }),
            MockResponse::NoResult => Ok(ScraperOutcome::NoResult),
            MockResponse::Fail(message) => Err(ScraperError::ApiError(message)),
            MockResponse::Panic(message) => panic!("{}", message),
        }
    }
}

/// Factory handing out one shared [`MockScraper`].
///
/// Clones share the scraper and the counters, so a test can keep one handle
/// while the registry owns another.
#[derive(Debug, Clone)]
pub struct MockScraperFactory {
    name: String,
    scraper: Arc<MockScraper>,
    created: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockScraperFactory {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scraper: Arc::new(MockScraper::new(name)),
            created: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn scraper(&self) -> Arc<MockScraper> {
        Arc::clone(&self.scraper)
    }

    /// How many times `create` has been called.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Make every later `create` call fail.
    pub fn fail_construction(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl ScraperFactory for MockScraperFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<Arc<dyn Scraper>, ScraperError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScraperError::Construction {
                name: self.name.clone(),
                reason: "mock construction failure".to_string(),
            });
        }
        Ok(self.scraper.clone())
    }
}
