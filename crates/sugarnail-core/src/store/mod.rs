//! Versioned response cache.
//!
//! A store holds named generations, each mapping a `RequestKey` to a
//! `CachedResponse`. Generations are created wholesale at install time and
//! dropped wholesale at activation time.
//!
//! Two implementations are provided:
//! - `MemoryCacheStore`: process-local, used by tests and embedders
//! - `DiskCacheStore`: one directory per generation, one JSON file per entry

pub mod disk;
pub mod memory;
pub mod record;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::net::RequestKey;

pub use disk::DiskCacheStore;
pub use memory::MemoryCacheStore;
pub use record::{CachedData, CachedResponse};

/// Storage shared by the lifecycle controller and the fetch interceptor.
///
/// Generations are addressed by name, so operations on different generations
/// never conflict. Concurrent writes to one key are last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of all existing generations.
    async fn generations(&self) -> Result<Vec<String>, StoreError>;

    async fn has_generation(&self, generation: &str) -> Result<bool, StoreError>;

    /// Drop a generation and every entry in it. Returns false if it did not exist.
    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError>;

    async fn match_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError>;

    /// Write one entry, creating the generation if needed.
    async fn put(
        &self,
        generation: &str,
        key: RequestKey,
        record: CachedResponse,
    ) -> Result<(), StoreError>;

    /// Write a batch of entries as one unit. A generation created by the batch
    /// only becomes visible once every entry is written.
    async fn put_all(
        &self,
        generation: &str,
        records: Vec<(RequestKey, CachedResponse)>,
    ) -> Result<(), StoreError>;

    /// Keys in a generation, sorted. Empty if the generation does not exist.
    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, StoreError>;
}
