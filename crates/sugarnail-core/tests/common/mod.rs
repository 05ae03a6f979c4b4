#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use sugarnail_core::config::{CacheVersion, WorkerConfig};
use sugarnail_core::manifest::AssetManifest;
use sugarnail_core::net::{Fetcher, Request, RequestKey, Response, ResponseType};
use sugarnail_core::store::{CacheStore, CachedResponse, MemoryCacheStore};
use sugarnail_core::worker::{ServiceWorker, WorkerEvent};
use sugarnail_core::{FetchError, StoreError};

pub const ORIGIN: &str = "https://sugarnail.test/";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub fn worker_config(version: &str) -> WorkerConfig {
    WorkerConfig::new(origin(), CacheVersion::new(version).unwrap())
}

#[derive(Clone)]
struct Route {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

/// In-process network: canned responses by request key, switchable offline.
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<RequestKey, Route>>,
    unreachable: Mutex<HashSet<RequestKey>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `body` with status 200 at a path or absolute URL.
    pub fn serve(&self, key: &str, body: &str) -> &Self {
        self.serve_with(key, 200, Vec::new(), body)
    }

    pub fn serve_with(
        &self,
        key: &str,
        status: u16,
        headers: Vec<(&str, &str)>,
        body: &str,
    ) -> &Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.routes.lock().unwrap().insert(
            RequestKey::from(key),
            Route {
                status,
                headers,
                body: Bytes::from(body.to_string()),
            },
        );
        self
    }

    pub fn unreachable(&self, key: &str) -> &Self {
        self.unreachable.lock().unwrap().insert(RequestKey::from(key));
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = request.key(&origin());
        if !self.online.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&key) {
            return Err(FetchError::Unavailable(key.to_string()));
        }

        let route = self.routes.lock().unwrap().get(&key).cloned().unwrap_or(Route {
            status: 404,
            headers: Vec::new(),
            body: Bytes::from_static(b"not found"),
        });
        let response_type = ResponseType::classify(&request.url, &origin(), &route.headers);
        Ok(Response {
            url: request.url.clone(),
            status: route.status,
            status_text: String::new(),
            headers: route.headers,
            body: route.body,
            response_type,
        })
    }
}

/// Memory store whose deletion of one generation always fails.
pub struct StickyGenerationStore {
    inner: MemoryCacheStore,
    sticky: String,
}

impl StickyGenerationStore {
    pub fn new(sticky: &str) -> Self {
        Self {
            inner: MemoryCacheStore::new(),
            sticky: sticky.to_string(),
        }
    }
}

#[async_trait]
impl CacheStore for StickyGenerationStore {
    async fn generations(&self) -> Result<Vec<String>, StoreError> {
        self.inner.generations().await
    }

    async fn has_generation(&self, generation: &str) -> Result<bool, StoreError> {
        self.inner.has_generation(generation).await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        if generation == self.sticky {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "generation is locked",
            )));
        }
        self.inner.delete_generation(generation).await
    }

    async fn match_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError> {
        self.inner.match_entry(generation, key).await
    }

    async fn put(
        &self,
        generation: &str,
        key: RequestKey,
        record: CachedResponse,
    ) -> Result<(), StoreError> {
        self.inner.put(generation, key, record).await
    }

    async fn put_all(
        &self,
        generation: &str,
        records: Vec<(RequestKey, CachedResponse)>,
    ) -> Result<(), StoreError> {
        self.inner.put_all(generation, records).await
    }

    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, StoreError> {
        self.inner.keys(generation).await
    }
}

/// Memory store that refuses every single-entry write.
pub struct ReadOnlyStore {
    inner: MemoryCacheStore,
}

impl ReadOnlyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCacheStore::new(),
        }
    }
}

#[async_trait]
impl CacheStore for ReadOnlyStore {
    async fn generations(&self) -> Result<Vec<String>, StoreError> {
        self.inner.generations().await
    }

    async fn has_generation(&self, generation: &str) -> Result<bool, StoreError> {
        self.inner.has_generation(generation).await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        self.inner.delete_generation(generation).await
    }

    async fn match_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError> {
        self.inner.match_entry(generation, key).await
    }

    async fn put(
        &self,
        _generation: &str,
        _key: RequestKey,
        _record: CachedResponse,
    ) -> Result<(), StoreError> {
        Err(StoreError::Io(io::Error::new(
            io::ErrorKind::Other,
            "no space left on device",
        )))
    }

    async fn put_all(
        &self,
        generation: &str,
        records: Vec<(RequestKey, CachedResponse)>,
    ) -> Result<(), StoreError> {
        self.inner.put_all(generation, records).await
    }

    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, StoreError> {
        self.inner.keys(generation).await
    }
}

pub fn record(body: &str) -> CachedResponse {
    CachedResponse {
        status: 200,
        status_text: "OK".to_string(),
        headers: Vec::new(),
        body: Bytes::from(body.to_string()),
        response_type: ResponseType::Basic,
    }
}

/// Fetcher serving every path of `manifest` with its own path as the body.
pub fn fetcher_for(manifest: &AssetManifest) -> Arc<ScriptedFetcher> {
    let fetcher = Arc::new(ScriptedFetcher::new());
    for path in manifest.paths() {
        fetcher.serve(path, &format!("body of {}", path));
    }
    fetcher
}

pub fn build_worker(
    config: WorkerConfig,
    manifest: AssetManifest,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<ScriptedFetcher>,
) -> (ServiceWorker, tokio::sync::mpsc::UnboundedReceiver<WorkerEvent>) {
    ServiceWorker::new(config, manifest, store, fetcher)
}

pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WorkerEvent>) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
