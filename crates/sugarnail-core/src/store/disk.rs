//! Disk-backed cache store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<generation>/<key>.json    CachedData<CachedResponse>
//! <root>/.staging-<generation>-<n>/ batch being assembled by put_all
//! ```
//!
//! Generation names and keys are percent-encoded into file names. Every file
//! is written to a temporary name and renamed into place, so readers never see
//! a torn record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use tokio::fs;
use tracing::{debug, warn};

use super::{CacheStore, CachedData, CachedResponse};
use crate::error::StoreError;
use crate::net::RequestKey;

const ENTRY_EXTENSION: &str = "json";
const STAGING_PREFIX: &str = ".staging-";
const TEMP_PREFIX: &str = ".tmp-";

pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    pub fn new(root: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(Self::encode_name(generation))
    }

    fn entry_file_name(key: &RequestKey) -> String {
        format!("{}.{}", Self::encode_name(key.as_str()), ENTRY_EXTENSION)
    }

    /// Percent-encode a name into a single path component.
    ///
    /// A leading `.` is escaped too: dot-prefixed names are reserved for
    /// staging and temp files, and `.`/`..` must never resolve outside the root.
    fn encode_name(name: &str) -> String {
        let encoded = urlencoding::encode(name).into_owned();
        match encoded.strip_prefix('.') {
            Some(rest) => format!("%2E{}", rest),
            None => encoded,
        }
    }

    fn unique_suffix() -> u64 {
        rand::thread_rng().gen()
    }

    /// Load the envelope of one entry, including its write time.
    pub async fn load_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedData<CachedResponse>>, StoreError> {
        let path = self.generation_dir(generation).join(Self::entry_file_name(key));
        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cached = serde_json::from_slice(&contents).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(cached))
    }

    async fn write_entry(dir: &Path, key: &RequestKey, record: CachedResponse) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(&CachedData::new(record))?;
        let target = dir.join(Self::entry_file_name(key));
        let temp = dir.join(format!("{}{}", TEMP_PREFIX, Self::unique_suffix()));
        fs::write(&temp, contents).await?;
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Move every entry of a finished staging directory into the generation.
    async fn commit_staging(&self, staging: &Path, generation_dir: &Path) -> Result<(), StoreError> {
        let Err(e) = fs::rename(staging, generation_dir).await else {
            return Ok(());
        };
        // Generation already exists: merge entry by entry
        if fs::metadata(generation_dir).await.is_err() {
            return Err(e.into());
        }

        let mut entries = fs::read_dir(staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            fs::rename(entry.path(), generation_dir.join(entry.file_name())).await?;
        }
        fs::remove_dir(staging).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn generations(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') || !entry.file_type().await?.is_dir() {
                continue;
            }
            match urlencoding::decode(name) {
                Ok(decoded) => names.push(decoded.into_owned()),
                Err(e) => warn!(dir = name, error = %e, "Skipping unrecognized cache directory"),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn has_generation(&self, generation: &str) -> Result<bool, StoreError> {
        match fs::metadata(self.generation_dir(generation)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        match fs::remove_dir_all(self.generation_dir(generation)).await {
            Ok(()) => {
                debug!(generation, "Deleted cache generation");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_entry(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError> {
        Ok(self.load_entry(generation, key).await?.map(|cached| cached.data))
    }

    async fn put(
        &self,
        generation: &str,
        key: RequestKey,
        record: CachedResponse,
    ) -> Result<(), StoreError> {
        let dir = self.generation_dir(generation);
        fs::create_dir_all(&dir).await?;
        Self::write_entry(&dir, &key, record).await
    }

    async fn put_all(
        &self,
        generation: &str,
        records: Vec<(RequestKey, CachedResponse)>,
    ) -> Result<(), StoreError> {
        let staging = self.root.join(format!(
            "{}{}-{}",
            STAGING_PREFIX,
            Self::encode_name(generation),
            Self::unique_suffix()
        ));
        fs::create_dir_all(&staging).await?;

        let mut result = Ok(());
        for (key, record) in records {
            if let Err(e) = Self::write_entry(&staging, &key, record).await {
                result = Err(e);
                break;
            }
        }
        if result.is_ok() {
            result = self.commit_staging(&staging, &self.generation_dir(generation)).await;
        }

        if result.is_err() {
            if let Err(e) = fs::remove_dir_all(&staging).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = ?staging, error = %e, "Failed to clean up staging directory");
                }
            }
        }
        result
    }

    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, StoreError> {
        let mut entries = match fs::read_dir(self.generation_dir(generation)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(encoded) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(".json"))
            else {
                continue;
            };
            if encoded.starts_with('.') {
                continue;
            }
            if let Ok(decoded) = urlencoding::decode(encoded) {
                keys.push(RequestKey::from(decoded.into_owned()));
            }
        }
        keys.sort();
        Ok(keys)
    }
}
