use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::config::CacheVersion;

/// Unique identifier for an open page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An open page instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub url: String,
    /// Generation serving this page, if any worker controls it.
    pub controller: Option<CacheVersion>,
}

/// Pages known to the worker.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, Client>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened page. It stays uncontrolled until the next claim.
    pub async fn open(&self, url: &str) -> ClientId {
        let id = ClientId::new();
        self.clients.write().await.insert(
            id,
            Client {
                id,
                url: url.to_string(),
                controller: None,
            },
        );
        id
    }

    pub async fn close(&self, id: ClientId) -> Option<Client> {
        self.clients.write().await.remove(&id)
    }

    pub async fn get(&self, id: ClientId) -> Option<Client> {
        self.clients.read().await.get(&id).cloned()
    }

    /// Make `version` the controller of every open page. Returns the page count.
    pub async fn claim(&self, version: &CacheVersion) -> usize {
        let mut clients = self.clients.write().await;
        for client in clients.values_mut() {
            client.controller = Some(version.clone());
        }
        clients.len()
    }

    pub async fn controlled_by(&self, version: &CacheVersion) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.controller.as_ref() == Some(version))
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
