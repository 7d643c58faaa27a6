use super::{CacheStore, DiskCacheStore, MemoryCacheStore, StorageError};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheType {
    Memory,
    Disk { path: PathBuf },
}

pub fn create_cache(cache_type: CacheType) -> Result<Arc<dyn CacheStore>, StorageError> {
    match cache_type {
        CacheType::Memory => Ok(Arc::new(MemoryCacheStore::new())),
        CacheType::Disk { path } => Ok(Arc::new(DiskCacheStore::new(path)?)),
    }
}
