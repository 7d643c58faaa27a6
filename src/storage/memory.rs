use super::base::{CacheEntry, CacheStore, StorageError};
use crate::http::RequestKey;
use crate::models::ScrapeResult;
use async_trait::async_trait;
use log::trace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// In-process cache holding serialized entries.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes `key` only while it still holds `raw`; a newer set is kept.
    fn remove_if_unchanged(&self, key: &str, raw: &str) -> bool {
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|current| current == raw) {
            entries.remove(key);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &RequestKey) -> Result<Option<ScrapeResult>, StorageError> {
        let raw = match self.entries.read().get(key.as_str()) {
            Some(raw) => raw.clone(),
            None => return Ok(None),
        };

        let entry = CacheEntry::decode(&raw)?;
        if entry.is_expired() {
            trace!("Dropping expired cache entry for {}", key);
            self.remove_if_unchanged(key.as_str(), &raw);
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
        let raw = entry.encode()?;
        self.entries.write().insert(key.as_str().to_string(), raw);
        Ok(())
    }
}
