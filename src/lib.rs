pub mod attributes;
pub mod core;
pub mod export;
pub mod fetchers;
pub mod http;
pub mod models;
pub mod parser;
pub mod stats;
pub mod storage;

pub use core::{
    BatchCoordinator, PipelineConfig, RateLimiter, ScrapeCoordinator, ScraperError, ScraperResult,
};
pub use fetchers::{DocumentFetcher, HttpFetcher};
pub use http::{RawContent, RequestKey};
pub use models::{ErrorKind, Record, ScrapeOutcome, ScrapeResult};
pub use parser::{FieldExtractor, HtmlProductExtractor, JsonProductExtractor};
pub use stats::StatsTracker;
pub use storage::{create_cache, CacheStore, CacheType};
