use crate::core::FetchError;
use crate::http::RawContent;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Retrieves documents for the pipeline.
///
/// Implementations decide how content is produced (plain HTTP, a rendering
/// browser, a JSON API) and must honour `timeout`.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Cheap existence check made before any rate-limit budget is spent.
    async fn probe(&self, url: &Url, timeout: Duration) -> Result<(), FetchError>;

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawContent, FetchError>;
}
