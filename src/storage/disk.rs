use super::base::{CacheEntry, CacheStore, StorageError};
use crate::http::RequestKey;
use crate::models::ScrapeResult;
use async_trait::async_trait;
use log::{debug, trace};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Cache persisted as one JSON file per key, so results survive restarts.
#[derive(Debug, Clone)]
pub struct DiskCacheStore {
    base_path: PathBuf,
}

impl DiskCacheStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::ConnectionError(format!("{}: {}", base_path.display(), e)))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, key: &RequestKey) -> PathBuf {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_str().as_bytes());
        self.base_path.join(format!("{}.json", id))
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn get(&self, key: &RequestKey) -> Result<Option<ScrapeResult>, StorageError> {
        let path = self.entry_path(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry = CacheEntry::decode(&raw)?;
        if entry.key != *key {
            debug!("Cache file {} belongs to {}, ignoring", path.display(), entry.key);
            return Ok(None);
        }
        if entry.is_expired() {
            trace!("Cache entry for {} expired at {}", key, entry.expires_at);
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(
        &self,
        key: &RequestKey,
        value: &ScrapeResult,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let entry = CacheEntry::new(key.clone(), value.clone(), ttl)?;
        let final_path = self.entry_path(key);
        // Each writer stages its own file; concurrent writers for a key race
        // only on the rename, so the last one wins with a complete entry.
        let tmp_path = self
            .base_path
            .join(format!("{}.tmp", Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp_path, serde_json::to_string_pretty(&entry)?).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        trace!("Cached {} at {}", key, final_path.display());
        Ok(())
    }
}
