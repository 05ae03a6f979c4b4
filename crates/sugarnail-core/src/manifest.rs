//! Assets that must be available offline.
//!
//! The manifest is fixed at deploy time. Any change to it must come with a new
//! cache version, otherwise installed workers keep serving the old assets.

use std::collections::HashSet;

use crate::error::WorkerError;
use crate::net::RequestKey;

/// Page shell assets installed into every cache generation.
pub const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/cart.html",
    "/orders.html",
    "/app.js",
    "/manifest.json",
    "/assets/icon-192.png",
    "/assets/icon-512.png",
    "/assets/logo.jpg",
    "/assets/basic-package.png",
    "/assets/deluxe-package.png",
    "/assets/premium-package.png",
    "/offline.html",
];

/// Ordered list of same-origin paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    entries: Vec<String>,
}

impl AssetManifest {
    pub fn new<I, S>(entries: I) -> Result<Self, WorkerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut validated = Vec::new();
        for entry in entries {
            let entry = entry.into();
            if !entry.starts_with('/') {
                return Err(WorkerError::InvalidManifest(format!(
                    "{:?} is not an absolute path",
                    entry
                )));
            }
            if !seen.insert(entry.clone()) {
                return Err(WorkerError::InvalidManifest(format!(
                    "{:?} is listed twice",
                    entry
                )));
            }
            validated.push(entry);
        }
        if validated.is_empty() {
            return Err(WorkerError::InvalidManifest("manifest is empty".to_string()));
        }
        Ok(Self { entries: validated })
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.iter().any(|e| e == key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
