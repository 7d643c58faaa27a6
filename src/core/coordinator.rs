use crate::core::config::PipelineConfig;
use crate::core::rate_limit::RateLimiter;
use crate::core::single_flight::InFlight;
use crate::core::FetchError;
use crate::fetchers::DocumentFetcher;
use crate::http::RequestKey;
use crate::models::{ErrorKind, ScrapeResult};
use crate::parser::FieldExtractor;
use crate::stats::StatsTracker;
use crate::storage::CacheStore;
use chrono::Utc;
use futures::FutureExt;
use log::{debug, info, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Serves a URL from cache when possible, otherwise probes it, waits for a
/// rate-limit permit, fetches, extracts and caches the result.
///
/// [`get_result`](Self::get_result) never fails: every problem ends up in the
/// returned [`ScrapeResult`].
pub struct ScrapeCoordinator {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn FieldExtractor>,
    cache: Arc<dyn CacheStore>,
    limiter: Arc<RateLimiter>,
    config: PipelineConfig,
    in_flight: Option<InFlight>,
    stats: Arc<StatsTracker>,
}

enum CacheLookup {
    Hit(ScrapeResult),
    Miss,
}

impl ScrapeCoordinator {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn FieldExtractor>,
        cache: Arc<dyn CacheStore>,
        limiter: Arc<RateLimiter>,
        config: PipelineConfig,
    ) -> Self {
        info!(
            "Initializing coordinator (rate limit {} per {:?}, cache ttl {:?}, single flight {})",
            limiter.calls(),
            limiter.period(),
            config.cache_ttl,
            config.single_flight
        );
        let in_flight = config.single_flight.then(InFlight::new);

        Self {
            fetcher,
            extractor,
            cache,
            limiter,
            config,
            in_flight,
            stats: Arc::new(StatsTracker::new()),
        }
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        Arc::clone(&self.stats)
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// [`get_result`](Self::get_result) with the configured fetch timeout.
    pub async fn scrape(&self, url: &str) -> ScrapeResult {
        self.get_result(url, self.config.fetch_timeout).await
    }

    pub async fn get_result(&self, url: &str, timeout: Duration) -> ScrapeResult {
        self.stats.record_request();

        let result = match RequestKey::parse_target(url) {
            Ok((key, target)) => {
                let outcome = AssertUnwindSafe(self.run(&key, &target, timeout))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = panic_message(&*panic);
                        warn!("Pipeline panicked for {}: {}", key, message);
                        ScrapeResult::failure(key, ErrorKind::InternalError, message)
                    }
                }
            }
            Err(e) => {
                warn!("Rejecting URL {}: {}", url, e);
                ScrapeResult::failure(RequestKey::raw(url), ErrorKind::InvalidUrl, e.to_string())
            }
        };

        match result.error_kind() {
            None => self.stats.record_success(),
            Some(kind) => self.stats.record_failure(kind),
        }
        result
    }

    async fn run(&self, key: &RequestKey, target: &Url, timeout: Duration) -> ScrapeResult {
        match self.lookup(key).await {
            Ok(CacheLookup::Hit(result)) => return result,
            Ok(CacheLookup::Miss) => {}
            Err(failure) => return failure,
        }

        // Only one fetch per key while single flight is on; whoever waited
        // behind it normally finds the fresh entry on the second look.
        let _flight = match &self.in_flight {
            Some(in_flight) => {
                let guard = in_flight.enter(key.as_str()).await;
                if let Ok(Some(result)) = self.cache.get(key).await {
                    debug!("Cache filled while waiting for {}", key);
                    self.stats.record_cache_hit();
                    return result;
                }
                Some(guard)
            }
            None => None,
        };

        self.fetch_and_extract(key, target, timeout).await
    }

    async fn lookup(&self, key: &RequestKey) -> Result<CacheLookup, ScrapeResult> {
        match self.cache.get(key).await {
            Ok(Some(result)) => {
                debug!("Cache hit for {}", key);
                self.stats.record_cache_hit();
                Ok(CacheLookup::Hit(result))
            }
            Ok(None) => {
                debug!("Cache miss for {}", key);
                self.stats.record_cache_miss();
                Ok(CacheLookup::Miss)
            }
            Err(e) => {
                self.stats.record_cache_read_error();
                if self.config.strict_cache {
                    warn!("Cache read failed for {}: {}", key, e);
                    Err(ScrapeResult::failure(
                        key.clone(),
                        ErrorKind::CacheStoreError,
                        e.to_string(),
                    ))
                } else {
                    warn!("Cache read failed for {}, fetching instead: {}", key, e);
                    Ok(CacheLookup::Miss)
                }
            }
        }
    }

    /// Fetches `url` as the caller wrote it; `key` is only used for the cache
    /// and the returned result.
    async fn fetch_and_extract(
        &self,
        key: &RequestKey,
        url: &Url,
        timeout: Duration,
    ) -> ScrapeResult {
        let probed = match tokio::time::timeout(timeout, self.fetcher.probe(url, timeout)).await {
            Ok(probed) => probed,
            Err(_) => Err(FetchError::InvalidUrl(format!(
                "{} did not answer within {}ms",
                url,
                timeout.as_millis()
            ))),
        };
        if let Err(e) = probed {
            warn!("Probe failed for {}: {}", url, e);
            return ScrapeResult::failure(key.clone(), ErrorKind::InvalidUrl, e.to_string());
        }

        self.limiter.acquire().await;

        info!("Fetching URL: {}", url);
        let started = Utc::now();
        let fetched = match tokio::time::timeout(timeout, self.fetcher.fetch(url, timeout)).await {
            Ok(fetched) => fetched,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis(),
            }),
        };

        let content = match fetched {
            Ok(content) => content,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                return ScrapeResult::failure(key.clone(), e.kind(), e.to_string());
            }
        };
        self.stats
            .record_fetch(content.len(), Utc::now().signed_duration_since(started));

        let extraction = match self.extractor.extract(&content) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("Extraction failed for {}: {}", url, e);
                return ScrapeResult::failure(key.clone(), ErrorKind::ParseError, e.to_string());
            }
        };

        if extraction.skipped > 0 {
            warn!("Skipped {} malformed records from {}", extraction.skipped, url);
        }
        self.stats
            .record_extraction(extraction.records.len(), extraction.skipped);
        info!("Extracted {} records from {}", extraction.records.len(), url);

        let result = ScrapeResult::success(key.clone(), extraction.records);
        if let Err(e) = self.cache.set(key, &result, self.config.cache_ttl).await {
            warn!("Failed to cache result for {}: {}", key, e);
            self.stats.record_cache_write_error();
        }

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "pipeline panicked".to_string()
    }
}
