use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use url::Url;

use super::DocumentFetcher;
use crate::core::FetchError;
use crate::http::RawContent;

#[derive(Clone)]
pub struct MockDocument {
    pub result: Result<RawContent, FetchError>,
    pub delay: Option<Duration>,
}

impl MockDocument {
    pub fn ok(content: RawContent) -> Self {
        Self {
            result: Ok(content),
            delay: None,
        }
    }

    pub fn err(error: FetchError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Scripted [`DocumentFetcher`] that records every call it receives.
///
/// URLs without a scripted document fail with a network error. The fetch
/// timeout is honoured, so a delayed document can simulate a slow site.
#[derive(Clone, Default)]
pub struct MockFetcher {
    documents: Arc<RwLock<HashMap<String, MockDocument>>>,
    dead: Arc<RwLock<HashSet<String>>>,
    probe_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
    fetch_log: Arc<RwLock<Vec<(String, Instant)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, url: &str, document: MockDocument) -> Self {
        self.set_document(url, document);
        self
    }

    pub fn with_dead_url(self, url: &str) -> Self {
        self.dead.write().insert(normalize(url));
        self
    }

    pub fn set_document(&self, url: &str, document: MockDocument) {
        self.documents.write().insert(normalize(url), document);
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// URLs passed to `fetch`, with the instant each call started.
    pub fn fetch_log(&self) -> Vec<(String, Instant)> {
        self.fetch_log.read().clone()
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn probe(&self, url: &Url, _timeout: Duration) -> Result<(), FetchError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.dead.read().contains(url.as_str()) {
            return Err(FetchError::InvalidUrl(format!("{} does not exist", url)));
        }
        Ok(())
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawContent, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_log
            .write()
            .push((url.to_string(), Instant::now()));

        let document = self.documents.read().get(url.as_str()).cloned();
        let document = match document {
            Some(document) => document,
            None => return Err(FetchError::Network(format!("no mock document for {}", url))),
        };

        if let Some(delay) = document.delay {
            if delay >= timeout {
                sleep(timeout).await;
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis(),
                });
            }
            sleep(delay).await;
        }

        document.result
    }
}
