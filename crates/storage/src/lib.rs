#![forbid(unsafe_code)]

pub mod cache;
pub mod repository;
pub mod sqlite;

pub use cache::{CacheError, FileCache, LocalCache, MemoryCache, progress_storage_key};
pub use repository::{InMemoryRepository, Storage, StorageError};
