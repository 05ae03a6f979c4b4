use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStore, CachedResponse};
use crate::error::StoreError;
use crate::net::RequestKey;

type Generation = HashMap<RequestKey, CachedResponse>;

/// In-memory cache store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    generations: RwLock<HashMap<String, Generation>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn generations(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.generations.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn has_generation(&self, generation: &str) -> Result<bool, StoreError> {
        Ok(self.generations.read().await.contains_key(generation))
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        Ok(self.generations.write().await.remove(generation).is_some())
    }

    async fn match_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError> {
        Ok(self
            .generations
            .read()
            .await
            .get(generation)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        generation: &str,
        key: RequestKey,
        record: CachedResponse,
    ) -> Result<(), StoreError> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }

    async fn put_all(
        &self,
        generation: &str,
        records: Vec<(RequestKey, CachedResponse)>,
    ) -> Result<(), StoreError> {
        // Single write lock: readers see all of the batch or none of it
        let mut generations = self.generations.write().await;
        generations
            .entry(generation.to_string())
            .or_default()
            .extend(records);
        Ok(())
    }

    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, StoreError> {
        let mut keys: Vec<RequestKey> = self
            .generations
            .read()
            .await
            .get(generation)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
