mod batch;
mod config;
mod coordinator;
mod errors;
mod rate_limit;
mod single_flight;


pub use batch::BatchCoordinator;
pub use config::PipelineConfig;
pub use coordinator::ScrapeCoordinator;
pub use errors::{ConfigError, ExtractError, FetchError, ScraperError, ScraperResult};
pub use rate_limit::RateLimiter;
pub use single_flight::{FlightGuard, InFlight};
