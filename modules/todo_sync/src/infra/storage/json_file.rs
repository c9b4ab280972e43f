//! Key-value store persisted as one JSON object on disk.
//!
//! Every write rewrites the whole file through a sibling temp file and a
//! rename, so a crash leaves either the old or the new contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::ports::KeyValueStore;

pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write of the file
    io: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, DomainError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            DomainError::storage(format!("parse {}: {}", self.path.display(), e))
        })
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DomainError::storage(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| DomainError::storage(format!("encode: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| DomainError::storage(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DomainError::storage(format!("rename to {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let _io = self.io.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    #[instrument(name = "todo_sync.storage.set", skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let _io = self.io.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await?;
        debug!(key, "Stored value");
        Ok(())
    }

    #[instrument(name = "todo_sync.storage.remove", skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        let _io = self.io.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries).await
    }
}
