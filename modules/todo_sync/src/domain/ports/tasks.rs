use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contract::model::{NewTask, Task, TaskPatch};
use crate::domain::error::DomainError;

/// Where tasks are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// REST API; ids and timestamps are assigned by the server.
    #[default]
    Remote,
    /// Device key-value store; ids are generated on the client.
    Local,
}

/// Port for task persistence, scoped by owner.
///
/// The remote backend scopes by bearer token and may ignore `owner`;
/// the local backend filters the shared collection by it.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn list(&self, owner: &str) -> Result<Vec<Task>, DomainError>;

    async fn get(&self, owner: &str, id: &str) -> Result<Task, DomainError>;

    async fn create(&self, owner: &str, new_task: NewTask) -> Result<Task, DomainError>;

    /// Returns the task as stored after the patch.
    async fn update(&self, owner: &str, id: &str, patch: &TaskPatch)
        -> Result<Task, DomainError>;

    async fn delete(&self, owner: &str, id: &str) -> Result<(), DomainError>;

    /// Delete several tasks, reporting each outcome. Default issues the deletes concurrently.
    async fn delete_many(
        &self,
        owner: &str,
        ids: &[String],
    ) -> Vec<(String, Result<(), DomainError>)> {
        let calls = ids.iter().map(|id| async move {
            let res = self.delete(owner, id).await;
            (id.clone(), res)
        });
        futures::future::join_all(calls).await
    }
}
