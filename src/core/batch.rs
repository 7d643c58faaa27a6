use crate::core::coordinator::ScrapeCoordinator;
use crate::models::ScrapeResult;
use futures::stream::{self, StreamExt};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Runs a [`ScrapeCoordinator`] over many URLs.
///
/// Up to `max_concurrency` URLs are in progress at once on the calling task.
/// Results come back in input order, one per input, and a failure for one
/// URL never affects another.
#[derive(Clone)]
pub struct BatchCoordinator {
    coordinator: Arc<ScrapeCoordinator>,
    max_concurrency: usize,
}

impl BatchCoordinator {
    /// A `max_concurrency` of zero is treated as one.
    pub fn new(coordinator: Arc<ScrapeCoordinator>, max_concurrency: usize) -> Self {
        Self {
            coordinator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_coordinator(coordinator: Arc<ScrapeCoordinator>) -> Self {
        let max_concurrency = coordinator.config().max_concurrency;
        Self::new(coordinator, max_concurrency)
    }

    pub fn coordinator(&self) -> &ScrapeCoordinator {
        &self.coordinator
    }

    pub async fn get_results<I, S>(&self, urls: I, timeout: Duration) -> Vec<ScrapeResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: Vec<S> = urls.into_iter().collect();
        info!(
            "Scraping batch of {} URLs (concurrency {})",
            urls.len(),
            self.max_concurrency
        );

        let coordinator = &self.coordinator;
        let results: Vec<ScrapeResult> = stream::iter(urls.iter())
            .map(|url| coordinator.get_result(url.as_ref(), timeout))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            "Batch finished: {} succeeded, {} failed",
            results.len() - failed,
            failed
        );
        results
    }
}
