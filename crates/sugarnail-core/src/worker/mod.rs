//! The offline worker: lifecycle, fetch interception and background hooks.
//!
//! `ServiceWorker` ties one cache version to a store, a network fetcher and the
//! pages it controls. Lifecycle transitions are published on an event channel
//! so hosts can observe ordering (stale generations are gone before pages are
//! claimed).

pub mod clients;
pub mod hooks;
pub mod interceptor;
pub mod lifecycle;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::manifest::AssetManifest;
use crate::net::{Fetcher, Request};
use crate::store::CacheStore;

pub use clients::{Client, ClientId, ClientRegistry};
pub use hooks::{handle_sync, Notification, SyncOutcome, SYNC_ORDERS_TAG};
pub use interceptor::{is_cacheable, FetchInterceptor, FetchOutcome, ResponseSource};
pub use lifecycle::{LifecycleController, WorkerState};

/// Lifecycle notifications, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    StateChanged { version: String, state: WorkerState },
    GenerationDeleted { generation: String },
    ClientsClaimed { version: String, count: usize },
}

/// Result of registering the worker script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// URL prefix of pages the worker may control.
    pub scope: String,
    pub script_url: String,
}

pub struct ServiceWorker {
    config: WorkerConfig,
    lifecycle: LifecycleController,
    interceptor: FetchInterceptor,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
}

impl ServiceWorker {
    pub fn new(
        config: WorkerConfig,
        manifest: AssetManifest,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clients = Arc::new(ClientRegistry::new());
        let interceptor = FetchInterceptor::new(&config, Arc::clone(&store), Arc::clone(&fetcher));
        let lifecycle = LifecycleController::new(
            config.clone(),
            manifest,
            store,
            Arc::clone(&fetcher),
            Arc::clone(&clients),
            tx,
        );

        (
            Self {
                config,
                lifecycle,
                interceptor,
                fetcher,
                clients,
            },
            rx,
        )
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Resolve the worker script against the origin. The scope is the
    /// script's directory.
    pub fn register(&self, script_path: &str) -> Result<Registration, WorkerError> {
        let script_url = self.config.origin.join(script_path)?;
        let scope: Url = script_url.join("./")?;
        debug!(scope = %scope, script = %script_url, "Registered worker");
        Ok(Registration {
            scope: scope.into(),
            script_url: script_url.into(),
        })
    }

    pub async fn install(&self) -> Result<(), WorkerError> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<(), WorkerError> {
        self.lifecycle.activate().await
    }

    /// Take control with a generation a previous run installed. See
    /// [`LifecycleController::resume`].
    pub async fn resume(&self) -> Result<bool, WorkerError> {
        self.lifecycle.resume().await
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }

    pub fn manifest(&self) -> &AssetManifest {
        self.lifecycle.manifest()
    }

    /// Answer a page request. Until the worker is active, requests go straight
    /// to the network without touching the cache.
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        if self.state().await.can_intercept_fetch() {
            return self.interceptor.handle(request).await;
        }

        let response = self.fetcher.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
        })
    }

    /// Wait for opportunistic cache writes to finish.
    pub async fn settle(&self) {
        self.interceptor.settle().await;
    }

    pub fn on_sync(&self, tag: &str) -> SyncOutcome {
        handle_sync(tag)
    }

    pub fn on_push(&self, payload: Option<&[u8]>) -> Notification {
        Notification::from_push(payload)
    }
}
