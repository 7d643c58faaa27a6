use crate::http::RequestKey;
use crate::models::ScrapeResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("cache backend unreachable: {0}")]
    ConnectionError(String),

    #[error("cache operation failed: {0}")]
    OperationError(String),

    #[error("cache serialization failed: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

/// A cached successful result and the moment it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub value: ScrapeResult,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Errors for failed results: only successes are cacheable.
    pub fn new(key: RequestKey, value: ScrapeResult, ttl: Duration) -> Result<Self, StorageError> {
        if !value.is_success() {
            return Err(StorageError::OperationError(format!(
                "refusing to cache failed result for {}",
                key
            )));
        }

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StorageError::OperationError(format!("invalid ttl: {}", e)))?;

        Ok(Self {
            key,
            value,
            expires_at: Utc::now() + ttl,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn encode(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Key-value store for successful scrape results.
///
/// `get` treats an expired entry as absent whether or not the backend has
/// physically removed it. Backend failures are errors, never misses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &RequestKey) -> Result<Option<ScrapeResult>, StorageError>;

    async fn set(
        &self,
        key: &RequestKey,
        value: &ScrapeResult,
        ttl: Duration,
    ) -> Result<(), StorageError>;
}
