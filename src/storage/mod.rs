pub mod base;
pub mod disk;
pub mod factory;
pub mod memory;

pub use base::{CacheEntry, CacheStore, StorageError};
pub use disk::DiskCacheStore;
pub use factory::{create_cache, CacheType};
pub use memory::MemoryCacheStore;
