//! The context object that owns every store for the lifetime of the process.
//!
//! Nothing in this crate is global: consumers build one [`TodoSyncContext`]
//! and reach the session, task and media stores through it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::TodoSyncConfig;
use crate::contract::model::SessionSnapshot;
use crate::domain::error::DomainError;
use crate::domain::media::MediaResolver;
use crate::domain::ports::{
    AuthGateway, BackendKind, ImageUploader, KeyValueStore, LocationDevice, MediaDevice,
    TaskGateway,
};
use crate::domain::session::SessionStore;
use crate::domain::task_store::{TaskStore, TaskStoreConfig};
use crate::infra::device::{PresetLocationDevice, PresetMediaDevice};
use crate::infra::http::{ApiClient, HttpAuthGateway, HttpImageUploader, HttpTaskGateway};
use crate::infra::storage::{LocalTaskGateway, OfflineAuthGateway};

/// Platform capabilities used by the media resolver.
#[derive(Clone)]
pub struct Devices {
    pub media: Arc<dyn MediaDevice>,
    pub location: Arc<dyn LocationDevice>,
}

impl Default for Devices {
    /// No camera, no gallery, no location: every capture is declined.
    fn default() -> Self {
        Self {
            media: Arc::new(PresetMediaDevice::default()),
            location: Arc::new(PresetLocationDevice::default()),
        }
    }
}

/// Backend adapters selected for one context.
pub struct Gateways {
    pub auth: Arc<dyn AuthGateway>,
    pub tasks: Arc<dyn TaskGateway>,
    pub uploader: Option<Arc<dyn ImageUploader>>,
}

pub struct TodoSyncContext {
    config: TodoSyncConfig,
    storage: Arc<dyn KeyValueStore>,
    session: Arc<SessionStore>,
    tasks: Arc<TaskStore>,
    media: Arc<MediaResolver>,
}

impl TodoSyncContext {
    /// Wire the stores for the configured backend.
    pub fn build(
        config: TodoSyncConfig,
        storage: Arc<dyn KeyValueStore>,
        devices: Devices,
    ) -> Result<Self, DomainError> {
        config
            .validate()
            .map_err(|m| DomainError::validation("config", m))?;

        let gateways = match config.backend {
            BackendKind::Remote => {
                let client = Arc::new(ApiClient::new(
                    &config.api.base_url,
                    storage.clone(),
                    config.api.request_timeout,
                    config.api.upload_timeout,
                )?);
                Gateways {
                    auth: Arc::new(HttpAuthGateway::new(client.clone())),
                    tasks: Arc::new(HttpTaskGateway::new(client.clone())),
                    uploader: Some(Arc::new(HttpImageUploader::new(client))),
                }
            }
            BackendKind::Local => Gateways {
                auth: Arc::new(OfflineAuthGateway::new()),
                tasks: Arc::new(LocalTaskGateway::new(storage.clone())),
                uploader: None,
            },
        };

        info!(backend = ?config.backend, "Building todo_sync context");
        Ok(Self::from_parts(config, storage, gateways, devices))
    }

    /// Wire the stores around caller-supplied adapters.
    pub fn from_parts(
        config: TodoSyncConfig,
        storage: Arc<dyn KeyValueStore>,
        gateways: Gateways,
        devices: Devices,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage.clone(), gateways.auth));
        let tasks = Arc::new(TaskStore::new(
            gateways.tasks,
            session.clone(),
            gateways.uploader.clone(),
            TaskStoreConfig {
                max_title_length: config.max_title_length,
            },
        ));
        let media = Arc::new(MediaResolver::new(
            devices.media,
            devices.location,
            gateways.uploader,
            config.unknown_location_label.clone(),
        ));

        Self {
            config,
            storage,
            session,
            tasks,
            media,
        }
    }

    pub fn config(&self) -> &TodoSyncConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    pub fn media(&self) -> &Arc<MediaResolver> {
        &self.media
    }

    /// Restore the persisted session and, when signed in, load its tasks.
    /// A failed load is logged; the session outcome stands.
    pub async fn start(&self) -> SessionSnapshot {
        let snap = self.session.initialize().await;
        if snap.is_authenticated {
            if let Err(e) = self.tasks.load().await {
                warn!("Initial task load failed: {}", e);
            }
        }
        snap
    }

    /// Sign in and replace the task list with the new user's tasks.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionSnapshot, DomainError> {
        let snap = self.session.login(email, password).await?;
        self.tasks.reset();
        if let Err(e) = self.tasks.load().await {
            warn!("Task load after sign-in failed: {}", e);
        }
        Ok(snap)
    }

    /// Sign out and drop the previous user's tasks from memory.
    pub async fn sign_out(&self) -> SessionSnapshot {
        self.tasks.reset();
        self.session.logout().await
    }
}
