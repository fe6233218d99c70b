//! The fixed set of scrapers invoked for every movie in a run.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Scraper, ScraperFactory};

/// Scrapers vetted for batch use.
pub const DEFAULT_ALLOWED_SCRAPERS: &[&str] = &[
    "bitsearch",
    "kickass",
    "magnetdl",
    "nyaa",
    "piratebay",
    "torrentio",
    "torrentz2",
    "yts",
];

/// Scrapers registered for this run, in registration order.
///
/// Each scraper is constructed once and shared across all movies.
#[derive(Default)]
pub struct ScraperRegistry {
    scrapers: Vec<Arc<dyn Scraper>>,
}

impl std::fmt::Debug for ScraperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperRegistry")
            .field("scrapers", &self.names())
            .finish()
    }
}

impl ScraperRegistry {
    /// Register every factory whose name is allow-listed, in factory order.
    ///
    /// Factories outside the allow-list are never constructed. A factory that
    /// fails to construct is logged and left out; a repeated name keeps the
    /// first registration.
    pub fn from_factories<S: AsRef<str>>(
        allowed: &[S],
        factories: Vec<Box<dyn ScraperFactory>>,
    ) -> Self {
        let mut scrapers: Vec<Arc<dyn Scraper>> = Vec::new();

        for factory in factories {
            let name = factory.name();
            if !allowed.iter().any(|a| a.as_ref() == name) {
                debug!(scraper = %name, "Scraper not allow-listed, skipping");
                continue;
            }
            if scrapers.iter().any(|s| s.name() == name) {
                warn!(scraper = %name, "Duplicate scraper factory, keeping the first");
                continue;
            }
            match factory.create() {
                Ok(scraper) => scrapers.push(scraper),
                Err(e) => warn!(scraper = %name, error = %e, "Failed to construct scraper"),
            }
        }

        let registry = Self { scrapers };
        info!(scrapers = ?registry.names(), "Scraper registry ready");
        registry
    }

    /// Registered scraper names, in invocation order.
    pub fn names(&self) -> Vec<&str> {
        self.scrapers.iter().map(|s| s.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scraper>> {
        self.scrapers.iter()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockScraperFactory;

    fn factories(names: &[&str]) -> (Vec<MockScraperFactory>, Vec<Box<dyn ScraperFactory>>) {
        let mocks: Vec<_> = names.iter().map(|n| MockScraperFactory::new(n)).collect();
        let boxed = mocks
            .iter()
            .map(|m| Box::new(m.clone()) as Box<dyn ScraperFactory>)
            .collect();
        (mocks, boxed)
    }

    #[test]
    fn test_only_allow_listed_are_registered() {
        let (mocks, boxed) = factories(&["yts", "eztv", "nyaa", "rarbg"]);
        let registry = ScraperRegistry::from_factories(DEFAULT_ALLOWED_SCRAPERS, boxed);

        assert_eq!(registry.names(), vec!["yts", "nyaa"]);
        // Non-allow-listed factories are never invoked
        assert_eq!(mocks[1].created_count(), 0);
        assert_eq!(mocks[3].created_count(), 0);
    }

    #[test]
    fn test_registration_follows_factory_order() {
        let (_, boxed) = factories(&["yts", "bitsearch", "piratebay"]);
        let registry = ScraperRegistry::from_factories(DEFAULT_ALLOWED_SCRAPERS, boxed);
        assert_eq!(registry.names(), vec!["yts", "bitsearch", "piratebay"]);
    }

    #[test]
    fn test_allow_listed_without_factory_is_absent() {
        let (_, boxed) = factories(&["nyaa"]);
        let registry = ScraperRegistry::from_factories(&["nyaa", "yts"], boxed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_each_scraper_constructed_once() {
        let (mocks, boxed) = factories(&["yts", "yts"]);
        let registry = ScraperRegistry::from_factories(DEFAULT_ALLOWED_SCRAPERS, boxed);
        assert_eq!(registry.len(), 1);
        assert_eq!(mocks[0].created_count(), 1);
    }

    #[test]
    fn test_failed_construction_is_skipped() {
        let broken = MockScraperFactory::new("kickass");
        broken.fail_construction();
        let (_, mut boxed) = factories(&["yts"]);
        boxed.insert(0, Box::new(broken));

        let registry = ScraperRegistry::from_factories(DEFAULT_ALLOWED_SCRAPERS, boxed);
        assert_eq!(registry.names(), vec!["yts"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ScraperRegistry::from_factories(DEFAULT_ALLOWED_SCRAPERS, vec![]);
        assert!(registry.is_empty());
    }
}
