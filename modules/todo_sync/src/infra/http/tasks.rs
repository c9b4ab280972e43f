use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use crate::contract::model::{NewTask, Task, TaskPatch};
use crate::domain::error::DomainError;
use crate::domain::ports::{BackendKind, TaskGateway};
use crate::infra::http::client::ApiClient;
use crate::infra::http::dto::{CreateTaskDto, TaskDto, UpdateTaskDto};

/// `/todos` resource. The server scopes every call to the bearer token.
pub struct HttpTaskGateway {
    client: Arc<ApiClient>,
}

impl HttpTaskGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    #[instrument(name = "todo_sync.http.tasks.list", skip_all)]
    async fn list(&self, owner: &str) -> Result<Vec<Task>, DomainError> {
        let url = self.client.endpoint(&["todos"])?;
        let envelope = self
            .client
            .send::<Vec<TaskDto>>(self.client.request(Method::GET, url))
            .await?;
        let count = envelope.count;
        let dtos = envelope.into_result("list tasks")?;
        debug!(count = count.unwrap_or(dtos.len() as u64), "Fetched tasks");
        Ok(dtos.into_iter().map(|d| d.into_task(owner)).collect())
    }

    #[instrument(name = "todo_sync.http.tasks.get", skip(self, owner), fields(task_id = %id))]
    async fn get(&self, owner: &str, id: &str) -> Result<Task, DomainError> {
        let url = self.client.endpoint(&["todos", id])?;
        let result = self
            .client
            .send::<TaskDto>(self.client.request(Method::GET, url))
            .await;
        match result {
            Err(DomainError::Api {
                status: Some(404), ..
            }) => Err(DomainError::task_not_found(id)),
            other => Ok(other?.into_result("get task")?.into_task(owner)),
        }
    }

    #[instrument(name = "todo_sync.http.tasks.create", skip_all)]
    async fn create(&self, owner: &str, new_task: NewTask) -> Result<Task, DomainError> {
        let url = self.client.endpoint(&["todos"])?;
        let body = CreateTaskDto::from(new_task);
        let dto = self
            .client
            .send::<TaskDto>(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_result("create task")?;
        Ok(dto.into_task(owner))
    }

    #[instrument(name = "todo_sync.http.tasks.update", skip(self, owner, patch), fields(task_id = %id))]
    async fn update(&self, owner: &str, id: &str, patch: &TaskPatch) -> Result<Task, DomainError> {
        let url = self.client.endpoint(&["todos", id])?;
        let body = UpdateTaskDto::from(patch);
        let dto = self
            .client
            .send::<TaskDto>(self.client.request(Method::PATCH, url).json(&body))
            .await?
            .into_result("update task")?;
        Ok(dto.into_task(owner))
    }

    #[instrument(name = "todo_sync.http.tasks.delete", skip(self, _owner), fields(task_id = %id))]
    async fn delete(&self, _owner: &str, id: &str) -> Result<(), DomainError> {
        let url = self.client.endpoint(&["todos", id])?;
        self.client
            .send::<serde_json::Value>(self.client.request(Method::DELETE, url))
            .await?
            .into_unit("delete task")
    }
}
