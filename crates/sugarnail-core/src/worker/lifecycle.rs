//! Install and activate transitions.
//!
//! A worker moves `Installing → Waiting → Activating → Active`. Install
//! populates the generation named by the configured version from the asset
//! manifest, all or nothing. Activate prunes every other generation and only
//! then claims the open pages.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::clients::ClientRegistry;
use super::WorkerEvent;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::manifest::AssetManifest;
use crate::net::{Fetcher, Request, RequestKey};
use crate::store::{CacheStore, CachedResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Populating the cache generation. Also the state a failed install stays in.
    #[default]
    Installing,
    /// Installed, waiting for the previous worker to release its pages.
    Waiting,
    /// Deleting stale generations.
    Activating,
    /// Controlling pages and intercepting fetches.
    Active,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Active)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Waiting => write!(f, "waiting"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Active => write!(f, "active"),
        }
    }
}

pub struct LifecycleController {
    config: WorkerConfig,
    manifest: AssetManifest,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
    state: RwLock<WorkerState>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl LifecycleController {
    pub fn new(
        config: WorkerConfig,
        manifest: AssetManifest,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<ClientRegistry>,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Self {
        Self {
            config,
            manifest,
            store,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Installing),
            events,
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        debug!(version = %self.config.version, %state, "Worker state changed");
        let _ = self.events.send(WorkerEvent::StateChanged {
            version: self.config.version.to_string(),
            state,
        });
    }

    /// Populate the current generation from the asset manifest.
    ///
    /// Every entry is fetched before anything is written. Any failure fails the
    /// whole install and leaves the store as it was; the worker stays
    /// `Installing` and can be retried. Running it again on an installed worker
    /// rewrites the same entries and keeps the current state.
    pub async fn install(&self) -> Result<(), WorkerError> {
        let previous = self.state().await;
        if previous == WorkerState::Activating {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Installing,
                actual: previous,
            });
        }

        let version = self.config.version.as_str();
        info!(version, entries = self.manifest.len(), "Installing cache generation");

        let fetches = self.manifest.paths().map(|path| self.fetch_asset(path));
        let records = join_all(fetches)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!(version, error = %e, "Install failed");
                e
            })?;

        self.store.put_all(version, records).await.map_err(|e| {
            warn!(version, error = %e, "Failed to store cache generation");
            WorkerError::Store(e)
        })?;

        info!(version, "Cache generation installed");

        if previous == WorkerState::Installing {
            self.set_state(WorkerState::Waiting).await;
            if self.config.skip_waiting {
                debug!(version, "Skipping wait, activating immediately");
                self.activate().await?;
            }
        }
        Ok(())
    }

    async fn fetch_asset(&self, path: &str) -> Result<(RequestKey, CachedResponse), WorkerError> {
        let version = self.config.version.as_str();
        let url = self.config.origin.join(path)?;
        let response = self
            .fetcher
            .fetch(&Request::get(url))
            .await
            .map_err(|e| WorkerError::InstallFailed {
                version: version.to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        if !response.ok() {
            return Err(WorkerError::from_install_status(
                version,
                path,
                response.status,
                &response.body,
            ));
        }

        debug!(path, bytes = response.body.len(), "Fetched manifest entry");
        Ok((RequestKey::from(path), CachedResponse::from(&response)))
    }

    /// Pick up a generation installed by an earlier run.
    ///
    /// If the current generation already exists in the store, the worker goes
    /// straight to activation, which prunes any leftovers from an interrupted
    /// upgrade. Returns false, leaving the state unchanged, if nothing is
    /// installed yet.
    pub async fn resume(&self) -> Result<bool, WorkerError> {
        let current = self.state().await;
        if current != WorkerState::Installing {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Installing,
                actual: current,
            });
        }

        let version = self.config.version.as_str();
        if !self.store.has_generation(version).await? {
            debug!(version, "No installed generation to resume");
            return Ok(false);
        }

        info!(version, "Resuming installed cache generation");
        self.set_state(WorkerState::Waiting).await;
        self.activate().await?;
        Ok(true)
    }

    /// Delete stale generations, then take control of every open page.
    ///
    /// A generation that fails to delete is logged and skipped. Clients are
    /// claimed only after every deletion has settled.
    pub async fn activate(&self) -> Result<(), WorkerError> {
        let current = self.state().await;
        if current != WorkerState::Waiting {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Waiting,
                actual: current,
            });
        }
        self.set_state(WorkerState::Activating).await;

        let version = self.config.version.as_str();
        let generations = match self.store.generations().await {
            Ok(generations) => generations,
            Err(e) => {
                warn!(version, error = %e, "Failed to list cache generations");
                self.set_state(WorkerState::Waiting).await;
                return Err(e.into());
            }
        };

        let deletions = generations
            .into_iter()
            .filter(|name| name != version)
            .map(|name| self.delete_stale(name));
        join_all(deletions).await;

        let count = self.clients.claim(&self.config.version).await;
        info!(version, clients = count, "Claimed clients");
        let _ = self.events.send(WorkerEvent::ClientsClaimed {
            version: version.to_string(),
            count,
        });

        self.set_state(WorkerState::Active).await;
        Ok(())
    }

    async fn delete_stale(&self, generation: String) {
        info!(generation = %generation, "Deleting old cache generation");
        match self.store.delete_generation(&generation).await {
            Ok(_) => {
                let _ = self.events.send(WorkerEvent::GenerationDeleted { generation });
            }
            Err(e) => {
                warn!(generation = %generation, error = %e, "Failed to delete old cache generation");
            }
        }
    }
}
