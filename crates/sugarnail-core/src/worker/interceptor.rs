//! Cache-first fetch policy.
//!
//! 1. Look the request up in the current generation; a hit is returned as is.
//! 2. On a miss, go to the network.
//! 3. A 200, same-origin GET response is copied into the cache in the
//!    background while the live response goes back to the caller.
//! 4. If the network is unreachable, answer with the offline fallback page
//!    when it is cached, otherwise fail.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::config::{CacheVersion, WorkerConfig};
use crate::error::{FetchError, WorkerError};
use crate::net::{Fetcher, Request, RequestKey, Response, ResponseType};
use crate::store::{CacheStore, CachedResponse};

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    OfflineFallback,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
}

/// Whether a network response may be cached opportunistically.
pub fn is_cacheable(request: &Request, response: &Response) -> bool {
    request.is_get() && response.status == 200 && response.response_type == ResponseType::Basic
}

pub struct FetchInterceptor {
    origin: Url,
    version: CacheVersion,
    offline_fallback: RequestKey,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl FetchInterceptor {
    pub fn new(config: &WorkerConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            origin: config.origin.clone(),
            version: config.version.clone(),
            offline_fallback: config.offline_fallback.clone(),
            store,
            fetcher,
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    pub async fn handle(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        let key = request.key(&self.origin);

        // Only GET responses are ever stored
        if request.is_get() {
            if let Some(record) = self.lookup(&key).await {
                debug!(key = %key, "Cache hit");
                return Ok(FetchOutcome {
                    response: record.into_response(request.url.clone()),
                    source: ResponseSource::Cache,
                });
            }
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if is_cacheable(request, &response) {
                    self.cache_in_background(key, CachedResponse::from(&response));
                } else {
                    debug!(
                        key = %key,
                        status = response.status,
                        response_type = ?response.response_type,
                        "Response not cacheable"
                    );
                }
                Ok(FetchOutcome {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(e) => self.offline_fallback(request, key, e).await,
        }
    }

    async fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        match self.store.match_entry(self.version.as_str(), key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn cache_in_background(&self, key: RequestKey, record: CachedResponse) {
        let store = Arc::clone(&self.store);
        let generation = self.version.to_string();
        let handle = tokio::spawn(async move {
            match store.put(&generation, key.clone(), record).await {
                Ok(()) => debug!(key = %key, generation = %generation, "Cached network response"),
                Err(e) => debug!(key = %key, error = %e, "Failed to cache network response"),
            }
        });

        if let Ok(mut pending) = self.pending_writes.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    async fn offline_fallback(
        &self,
        request: &Request,
        key: RequestKey,
        error: FetchError,
    ) -> Result<FetchOutcome, WorkerError> {
        debug!(key = %key, error = %error, "Network fetch failed, trying offline page");
        match self.lookup(&self.offline_fallback).await {
            Some(record) => Ok(FetchOutcome {
                response: record.into_response(request.url.clone()),
                source: ResponseSource::OfflineFallback,
            }),
            None => {
                warn!(key = %key, "Offline and no fallback page cached");
                Err(WorkerError::Offline(key.to_string()))
            }
        }
    }

    /// Wait for every background cache write started so far.
    pub async fn settle(&self) {
        let pending = match self.pending_writes.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in pending {
            let _ = handle.await;
        }
    }
}
