use crate::models::ErrorKind;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub total_requests: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_read_errors: usize,
    pub cache_write_errors: usize,
    pub fetches: usize,
    pub successful_scrapes: usize,
    pub failed_scrapes: usize,
    pub errors: HashMap<ErrorKind, usize>,
    pub records_extracted: usize,
    pub records_skipped: usize,
    pub bytes_downloaded: usize,
    pub average_fetch_time: f64, // in milliseconds
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                total_requests: 0,
                cache_hits: 0,
                cache_misses: 0,
                cache_read_errors: 0,
                cache_write_errors: 0,
                fetches: 0,
                successful_scrapes: 0,
                failed_scrapes: 0,
                errors: HashMap::new(),
                records_extracted: 0,
                records_skipped: 0,
                bytes_downloaded: 0,
                average_fetch_time: 0.0,
            })),
        }
    }

    pub fn record_request(&self) {
        self.stats.write().total_requests += 1;
    }

    pub fn record_cache_hit(&self) {
        self.stats.write().cache_hits += 1;
    }

    pub fn record_cache_miss(&self) {
        self.stats.write().cache_misses += 1;
    }

    pub fn record_cache_read_error(&self) {
        self.stats.write().cache_read_errors += 1;
    }

    pub fn record_cache_write_error(&self) {
        self.stats.write().cache_write_errors += 1;
    }

    pub fn record_fetch(&self, size: usize, duration: Duration) {
        let mut stats = self.stats.write();
        stats.fetches += 1;
        stats.bytes_downloaded += size;

        let current_total = stats.average_fetch_time * (stats.fetches - 1) as f64;
        let new_duration = duration.num_milliseconds() as f64;
        stats.average_fetch_time = (current_total + new_duration) / stats.fetches as f64;
    }

    pub fn record_extraction(&self, extracted: usize, skipped: usize) {
        let mut stats = self.stats.write();
        stats.records_extracted += extracted;
        stats.records_skipped += skipped;
    }

    pub fn record_success(&self) {
        self.stats.write().successful_scrapes += 1;
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        let mut stats = self.stats.write();
        stats.failed_scrapes += 1;
        *stats.errors.entry(kind).or_insert(0) += 1;
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = Utc::now().signed_duration_since(stats.start_time);

        println!("\nScraping Statistics:");
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Total Requests: {}", stats.total_requests);
        println!(
            "Cache: {} hits, {} misses, {} read errors, {} write errors",
            stats.cache_hits, stats.cache_misses, stats.cache_read_errors, stats.cache_write_errors
        );
        println!("Fetches: {}", stats.fetches);
        println!("Successful Scrapes: {}", stats.successful_scrapes);
        println!("Failed Scrapes: {}", stats.failed_scrapes);
        println!(
            "Records: {} extracted, {} skipped",
            stats.records_extracted, stats.records_skipped
        );
        println!(
            "Data Downloaded: {:.2} MB",
            stats.bytes_downloaded as f64 / 1_000_000.0
        );
        println!("Average Fetch Time: {:.2}ms", stats.average_fetch_time);

        if !stats.errors.is_empty() {
            println!("\nErrors:");
            for (kind, count) in &stats.errors {
                println!("  {}: {}", kind, count);
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
