pub mod http_fetcher;
pub mod mock_fetcher;

mod fetcher;
pub use fetcher::DocumentFetcher;
pub use http_fetcher::HttpFetcher;
pub use mock_fetcher::{MockDocument, MockFetcher};
