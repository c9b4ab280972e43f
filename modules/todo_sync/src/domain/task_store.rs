use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{ClearReport, NewTask, Task, TaskPatch, TodoLocation};
use crate::domain::error::DomainError;
use crate::domain::locks::MutationLocks;
use crate::domain::media::prepare_photo;
use crate::domain::phase::{PhaseEvent, TaskPhase};
use crate::domain::ports::{BackendKind, ImageUploader, TaskGateway};
use crate::domain::session::SessionStore;

/// Configuration for the task store
#[derive(Debug, Clone)]
pub struct TaskStoreConfig {
    pub max_title_length: usize,
}

impl Default for TaskStoreConfig {
    fn default() -> Self {
        Self {
            max_title_length: 500,
        }
    }
}

/// Fields a caller may change on an existing task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub photo_uri: Option<String>,
    pub location: Option<TodoLocation>,
}

/// In-memory task list of the signed-in user, kept in step with a [`TaskGateway`].
///
/// This is the only writer of the list. Mutations of one task id are
/// serialized; per-item mutations never raise the loading flag.
pub struct TaskStore {
    gateway: Arc<dyn TaskGateway>,
    session: Arc<SessionStore>,
    uploader: Option<Arc<dyn ImageUploader>>,
    config: TaskStoreConfig,
    tasks: RwLock<Vec<Task>>,
    phases: DashMap<String, TaskPhase>,
    locks: MutationLocks,
    loading: AtomicBool,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl TaskStore {
    pub fn new(
        gateway: Arc<dyn TaskGateway>,
        session: Arc<SessionStore>,
        uploader: Option<Arc<dyn ImageUploader>>,
        config: TaskStoreConfig,
    ) -> Self {
        Self {
            gateway,
            session,
            uploader,
            config,
            tasks: RwLock::new(Vec::new()),
            phases: DashMap::new(),
            locks: MutationLocks::new(),
            loading: AtomicBool::new(false),
        }
    }

    // --- read side ---

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.tasks.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn total_count(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.read().iter().filter(|t| t.completed).count()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Lifecycle phase of a visible task; `None` for unknown ids.
    pub fn phase(&self, id: &str) -> Option<TaskPhase> {
        if !self.tasks.read().iter().any(|t| t.id == id) {
            return None;
        }
        Some(self.phase_of(id))
    }

    pub fn backend(&self) -> BackendKind {
        self.gateway.kind()
    }

    /// Forget the cached list (e.g. after sign-out).
    pub fn reset(&self) {
        self.tasks.write().clear();
        self.phases.clear();
    }

    // --- whole-list operations ---

    /// Replace the list with the backend's view. On failure the previous list is kept.
    #[instrument(name = "todo_sync.tasks.load", skip(self))]
    pub async fn load(&self) -> Result<Vec<Task>, DomainError> {
        let owner = self.owner()?;
        let _loading = LoadingGuard::raise(&self.loading);

        match self.gateway.list(&owner).await {
            Ok(list) => {
                let ids: HashSet<&str> = list.iter().map(|t| t.id.as_str()).collect();
                self.phases.retain(|id, _| ids.contains(id.as_str()));
                *self.tasks.write() = list.clone();
                debug!("Loaded {} tasks", list.len());
                Ok(list)
            }
            Err(e) => {
                warn!("Failed to load tasks, keeping previous list: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch one task from the backend and refresh its cached copy.
    #[instrument(name = "todo_sync.tasks.fetch", skip(self), fields(task_id = %id))]
    pub async fn fetch(&self, id: &str) -> Result<Task, DomainError> {
        let owner = self.owner()?;
        let fresh = self.gateway.get(&owner, id).await?;
        self.replace_cached(fresh.clone());
        Ok(fresh)
    }

    // --- mutations ---

    /// Create a task. Blank titles are ignored and return `Ok(None)`.
    #[instrument(name = "todo_sync.tasks.add", skip(self, title, photo_uri, location))]
    pub async fn add(
        &self,
        title: &str,
        photo_uri: Option<String>,
        location: Option<TodoLocation>,
    ) -> Result<Option<Task>, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring blank title");
            return Ok(None);
        }
        self.validate_title(title)?;
        let owner = self.owner()?;

        let photo_uri = prepare_photo(self.uploader.as_deref(), photo_uri).await;
        let new_task = NewTask {
            title: title.to_string(),
            photo_uri,
            location,
        };

        // the task has no id until the backend answers, so PendingCreate is never cached
        match self.gateway.create(&owner, new_task).await {
            Ok(task) => {
                let settled = TaskPhase::PendingCreate.on(PhaseEvent::Confirmed)?;
                {
                    let mut tasks = self.tasks.write();
                    tasks.retain(|t| t.id != task.id);
                    tasks.insert(0, task.clone());
                }
                self.phases.insert(task.id.clone(), settled);
                info!(task_id = %task.id, "Task created");

                if self.gateway.kind() == BackendKind::Remote {
                    // absorb server-assigned fields; the create itself already succeeded
                    if let Err(e) = self.load().await {
                        warn!("Reload after create failed: {}", e);
                    }
                }
                Ok(Some(self.task(&task.id).unwrap_or(task)))
            }
            Err(e) => {
                let settled = TaskPhase::PendingCreate.on(PhaseEvent::Failed)?;
                warn!(phase = %settled, "Task creation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Partial update. A blank replacement title is rejected; a photo whose upload
    /// fails is dropped from the change while the other fields still apply.
    #[instrument(name = "todo_sync.tasks.update", skip(self, edit), fields(task_id = %id))]
    pub async fn update(&self, id: &str, edit: TaskEdit) -> Result<Task, DomainError> {
        let owner = self.owner()?;

        let mut patch = TaskPatch::default();
        if let Some(title) = edit.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(DomainError::BlankTitle);
            }
            self.validate_title(title)?;
            patch.title = Some(title.to_string());
        }
        patch.photo_uri = prepare_photo(self.uploader.as_deref(), edit.photo_uri).await;
        patch.location = edit.location;

        let _guard = self.locks.acquire(id).await;
        if patch.is_empty() {
            return self.task(id).ok_or_else(|| DomainError::task_not_found(id));
        }
        self.apply_optimistic(&owner, id, PhaseEvent::BeginUpdate, patch)
            .await
    }

    /// Flip `completed`. Applied locally first; reverted if the backend rejects it.
    #[instrument(name = "todo_sync.tasks.toggle", skip(self), fields(task_id = %id))]
    pub async fn toggle(&self, id: &str) -> Result<Task, DomainError> {
        let owner = self.owner()?;
        let _guard = self.locks.acquire(id).await;

        // read under the lock so a queued toggle sees the settled value
        let current = self
            .task(id)
            .ok_or_else(|| DomainError::task_not_found(id))?;
        let patch = TaskPatch {
            completed: Some(!current.completed),
            ..Default::default()
        };
        self.apply_optimistic(&owner, id, PhaseEvent::BeginToggle, patch)
            .await
    }

    /// Delete a task. It stays visible until the backend confirms.
    #[instrument(name = "todo_sync.tasks.remove", skip(self), fields(task_id = %id))]
    pub async fn remove(&self, id: &str) -> Result<(), DomainError> {
        let owner = self.owner()?;
        let guard = self.locks.acquire(id).await;

        if self.task(id).is_none() {
            return Err(DomainError::task_not_found(id));
        }
        let deleting = self.phase_of(id).on(PhaseEvent::BeginDelete)?;
        self.phases.insert(id.to_string(), deleting);

        match self.gateway.delete(&owner, id).await {
            Ok(()) => {
                deleting.on(PhaseEvent::Confirmed)?;
                self.tasks.write().retain(|t| t.id != id);
                self.phases.remove(id);
                drop(guard);
                self.locks.forget(id);
                info!("Task removed");
                Ok(())
            }
            Err(e) => {
                self.phases
                    .insert(id.to_string(), deleting.on(PhaseEvent::Failed)?);
                warn!("Delete failed, task kept: {}", e);
                Err(e)
            }
        }
    }

    /// Delete every completed task. Deletes run concurrently and memory is
    /// updated once all of them have settled; tasks whose delete failed stay.
    #[instrument(name = "todo_sync.tasks.clear_completed", skip(self))]
    pub async fn clear_completed(&self) -> Result<ClearReport, DomainError> {
        let owner = self.owner()?;

        let candidates: Vec<String> = self
            .tasks
            .read()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id.clone())
            .collect();
        if candidates.is_empty() {
            return Ok(ClearReport::default());
        }

        let guards = self.locks.acquire_many(&candidates).await;

        // a queued toggle may have un-completed some of them meanwhile
        let mut ids = Vec::with_capacity(candidates.len());
        let mut transitions = Vec::with_capacity(candidates.len());
        for id in candidates {
            if !self.task(&id).map(|t| t.completed).unwrap_or(false) {
                continue;
            }
            transitions.push(self.phase_of(&id).on(PhaseEvent::BeginDelete)?);
            ids.push(id);
        }
        for (id, phase) in ids.iter().zip(transitions) {
            self.phases.insert(id.clone(), phase);
        }

        let outcomes = self.gateway.delete_many(&owner, &ids).await;

        let mut report = ClearReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.removed.push(id),
                Err(e) => {
                    warn!(task_id = %id, "Delete failed during clear: {}", e);
                    report.failed.push(id);
                }
            }
        }

        let removed: HashSet<&str> = report.removed.iter().map(String::as_str).collect();
        self.tasks
            .write()
            .retain(|t| !removed.contains(t.id.as_str()));
        for id in &report.removed {
            self.phases.remove(id);
        }
        for id in &report.failed {
            self.phases
                .insert(id.clone(), TaskPhase::Deleting.on(PhaseEvent::Failed)?);
        }

        drop(guards);
        for id in &report.removed {
            self.locks.forget(id);
        }

        info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Cleared completed tasks"
        );
        Ok(report)
    }

    // --- helpers ---

    /// Caller must hold the id lock.
    async fn apply_optimistic(
        &self,
        owner: &str,
        id: &str,
        begin: PhaseEvent,
        patch: TaskPatch,
    ) -> Result<Task, DomainError> {
        let snapshot = self
            .task(id)
            .ok_or_else(|| DomainError::task_not_found(id))?;
        let in_flight = self.phase_of(id).on(begin)?;

        self.modify_cached(id, |t| patch.apply_to(t));
        self.phases.insert(id.to_string(), in_flight);

        match self.gateway.update(owner, id, &patch).await {
            Ok(confirmed) => {
                self.phases
                    .insert(id.to_string(), in_flight.on(PhaseEvent::Confirmed)?);
                self.replace_cached(confirmed.clone());
                debug!(phase = %in_flight, "Change confirmed");
                Ok(confirmed)
            }
            Err(e) => {
                self.replace_cached(snapshot);
                self.phases
                    .insert(id.to_string(), in_flight.on(PhaseEvent::Failed)?);
                warn!(phase = %in_flight, "Change rejected, rolled back: {}", e);
                Err(e)
            }
        }
    }

    fn modify_cached(&self, id: &str, f: impl FnOnce(&mut Task)) {
        if let Some(task) = self.tasks.write().iter_mut().find(|t| t.id == id) {
            f(task);
        }
    }

    fn replace_cached(&self, task: Task) {
        if let Some(slot) = self.tasks.write().iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn phase_of(&self, id: &str) -> TaskPhase {
        self.phases
            .get(id)
            .map(|p| *p)
            .unwrap_or(TaskPhase::Persisted)
    }

    fn owner(&self) -> Result<String, DomainError> {
        let snap = self.session.snapshot();
        if !snap.is_authenticated {
            return Err(DomainError::NotAuthenticated);
        }
        // authenticated with an unknown user: the remote backend scopes by token
        Ok(snap.owner_key().unwrap_or_default().to_string())
    }

    fn validate_title(&self, title: &str) -> Result<(), DomainError> {
        let len = title.chars().count();
        if len > self.config.max_title_length {
            return Err(DomainError::title_too_long(
                len,
                self.config.max_title_length,
            ));
        }
        Ok(())
    }
}
