use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{header, Client, ClientBuilder, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::DocumentFetcher;
use crate::core::FetchError;
use crate::http::RawContent;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HttpFetcherError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] header::InvalidHeaderName),
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

/// [`DocumentFetcher`] backed by a plain reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new().expect("Failed to create default HttpFetcher")
    }
}

impl HttpFetcher {
    pub fn new() -> Result<Self, HttpFetcherError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, HttpFetcherError> {
        let client = ClientBuilder::new()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_headers<K, V>(
        mut self,
        user_agent: &str,
        headers: &[(K, V)],
    ) -> Result<Self, HttpFetcherError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut header_map = header::HeaderMap::new();
        header_map.insert(header::USER_AGENT, header::HeaderValue::from_str(user_agent)?);

        for (key, value) in headers {
            let name = header::HeaderName::from_bytes(key.as_ref().as_bytes())?;
            let value = header::HeaderValue::from_str(value.as_ref())?;
            header_map.insert(name, value);
        }

        self.client = ClientBuilder::new()
            .default_headers(header_map)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(self)
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }

    fn classify(url: &Url, timeout: Duration, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis(),
            }
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }

    fn ensure_http(url: &Url) -> Result<(), FetchError> {
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme `{}` in {}",
                other, url
            ))),
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn probe(&self, url: &Url, timeout: Duration) -> Result<(), FetchError> {
        Self::ensure_http(url)?;

        let response = self
            .client
            .head(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let status = response.status();
        trace!("Probe {} -> {}", url, status);
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(FetchError::InvalidUrl(format!("{} returned {}", url, status)))
            }
            _ => Ok(()),
        }
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawContent, FetchError> {
        Self::ensure_http(url)?;

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} from {}", status.as_u16(), url)));
        }

        let headers = Self::extract_headers(&response);
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(url, timeout, e))?;

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(RawContent::from_body(&headers, body))
    }
}
