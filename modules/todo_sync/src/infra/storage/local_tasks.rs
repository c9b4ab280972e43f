//! Task persistence in the device key-value store.
//!
//! All users share the single `todos` array. Every write re-reads the whole
//! collection under a lock, changes only the caller's records and writes the
//! merged array back, so other users' tasks are never lost.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{NewTask, Task, TaskPatch};
use crate::domain::error::DomainError;
use crate::domain::ports::storage::keys;
use crate::domain::ports::{BackendKind, KeyValueStore, TaskGateway};
use crate::infra::storage::entity::StoredTask;

pub struct LocalTaskGateway {
    storage: Arc<dyn KeyValueStore>,
    io: Mutex<()>,
}

impl LocalTaskGateway {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            io: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<StoredTask>, DomainError> {
        let Some(raw) = self.storage.get(keys::TODOS).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .map_err(|e| DomainError::storage(format!("decode {}: {}", keys::TODOS, e)))
    }

    async fn write_all(&self, all: &[StoredTask]) -> Result<(), DomainError> {
        let json = serde_json::to_string(all)
            .map_err(|e| DomainError::storage(format!("encode {}: {}", keys::TODOS, e)))?;
        self.storage.set(keys::TODOS, &json).await
    }

    /// Replace the owner's slice of the collection, keeping everyone else's records.
    async fn save_owned(&self, owner: &str, mine: Vec<StoredTask>) -> Result<(), DomainError> {
        let mut merged: Vec<StoredTask> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|t| t.owner_id != owner)
            .collect();
        merged.extend(mine);
        self.write_all(&merged).await
    }

    async fn read_owned(&self, owner: &str) -> Result<Vec<StoredTask>, DomainError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|t| t.owner_id == owner)
            .collect())
    }
}

fn require_owner(owner: &str) -> Result<(), DomainError> {
    if owner.is_empty() {
        return Err(DomainError::NotAuthenticated);
    }
    Ok(())
}

#[async_trait]
impl TaskGateway for LocalTaskGateway {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    #[instrument(name = "todo_sync.local.list", skip(self))]
    async fn list(&self, owner: &str) -> Result<Vec<Task>, DomainError> {
        require_owner(owner)?;
        let _io = self.io.lock().await;
        let mine = self.read_owned(owner).await?;
        debug!("Read {} local tasks", mine.len());
        Ok(mine.into_iter().map(Into::into).collect())
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Task, DomainError> {
        require_owner(owner)?;
        let _io = self.io.lock().await;
        self.read_owned(owner)
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .map(Into::into)
            .ok_or_else(|| DomainError::task_not_found(id))
    }

    #[instrument(name = "todo_sync.local.create", skip(self, new_task))]
    async fn create(&self, owner: &str, new_task: NewTask) -> Result<Task, DomainError> {
        require_owner(owner)?;
        let task = Task {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            title: new_task.title.trim().to_string(),
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
            photo_uri: new_task.photo_uri,
            location: new_task.location,
        };

        let _io = self.io.lock().await;
        let mut mine = self.read_owned(owner).await?;
        mine.insert(0, StoredTask::from(task.clone()));
        self.save_owned(owner, mine).await?;
        Ok(task)
    }

    #[instrument(name = "todo_sync.local.update", skip(self, patch), fields(task_id = %id))]
    async fn update(&self, owner: &str, id: &str, patch: &TaskPatch) -> Result<Task, DomainError> {
        require_owner(owner)?;
        let _io = self.io.lock().await;
        let mut mine = self.read_owned(owner).await?;
        let slot = mine
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::task_not_found(id))?;

        let mut task = Task::from(slot.clone());
        patch.apply_to(&mut task);
        task.title = task.title.trim().to_string();
        task.updated_at = Some(Utc::now());
        *slot = StoredTask::from(task.clone());

        self.save_owned(owner, mine).await?;
        Ok(task)
    }

    #[instrument(name = "todo_sync.local.delete", skip(self), fields(task_id = %id))]
    async fn delete(&self, owner: &str, id: &str) -> Result<(), DomainError> {
        require_owner(owner)?;
        let _io = self.io.lock().await;
        let mut mine = self.read_owned(owner).await?;
        let before = mine.len();
        mine.retain(|t| t.id != id);
        if mine.len() == before {
            return Err(DomainError::task_not_found(id));
        }
        self.save_owned(owner, mine).await
    }

    /// One read-modify-write for the whole batch.
    #[instrument(name = "todo_sync.local.delete_many", skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(
        &self,
        owner: &str,
        ids: &[String],
    ) -> Vec<(String, Result<(), DomainError>)> {
        if let Err(e) = require_owner(owner) {
            return ids.iter().map(|id| (id.clone(), Err(e.clone()))).collect();
        }

        let _io = self.io.lock().await;
        let mine = match self.read_owned(owner).await {
            Ok(mine) => mine,
            Err(e) => return ids.iter().map(|id| (id.clone(), Err(e.clone()))).collect(),
        };

        let present: HashSet<&str> = mine.iter().map(|t| t.id.as_str()).collect();
        let doomed: HashSet<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| present.contains(id))
            .collect();
        let kept: Vec<StoredTask> = mine
            .iter()
            .filter(|t| !doomed.contains(t.id.as_str()))
            .cloned()
            .collect();

        let saved = self.save_owned(owner, kept).await;
        if let Err(e) = &saved {
            warn!("Failed to persist batch delete: {}", e);
        }

        ids.iter()
            .map(|id| {
                let outcome = if !doomed.contains(id.as_str()) {
                    Err(DomainError::task_not_found(id))
                } else {
                    saved.clone()
                };
                (id.clone(), outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::InMemoryStore;

    #[tokio::test]
    async fn legacy_records_are_readable() {
        let legacy = r#"[{"id":"1700000000000","title":"old","username":"ana","completed":true,
            "createdAt":"2024-01-01T00:00:00Z","imageUri":"file:///a.jpg"}]"#;
        let store = Arc::new(InMemoryStore::with_entries([(keys::TODOS, legacy)]));
        let gateway = LocalTaskGateway::new(store);

        let tasks = gateway.list("ana").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].photo_uri.as_deref(), Some("file:///a.jpg"));
        assert!(tasks[0].completed);
    }

    #[tokio::test]
    async fn empty_owner_is_rejected() {
        let gateway = LocalTaskGateway::new(Arc::new(InMemoryStore::new()));
        assert_eq!(
            gateway.list("").await.unwrap_err(),
            DomainError::NotAuthenticated
        );
    }
}
