#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use todo_sync::contract::model::{
    AuthGrant, Credentials, MediaSource, NewTask, PartialUser, Task, TaskPatch, UploadedImage,
    User,
};
use todo_sync::domain::error::DomainError;
use todo_sync::domain::ports::{
    AuthGateway, BackendKind, Coordinates, GeocodedPlace, ImageUploader, KeyValueStore,
    LocationDevice, MediaDevice, TaskGateway,
};
use todo_sync::domain::session::SessionStore;
use todo_sync::domain::task_store::{TaskStore, TaskStoreConfig};
use todo_sync::infra::storage::InMemoryStore;

pub const OWNER: &str = "u1";

pub fn task(id: &str, title: &str, completed: bool) -> Task {
    Task {
        id: id.to_string(),
        owner_id: OWNER.to_string(),
        title: title.to_string(),
        completed,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        updated_at: None,
        photo_uri: None,
        location: None,
    }
}

pub fn network_down() -> DomainError {
    DomainError::network("connection refused")
}

// --- task gateway ---

/// Backend double: keeps tasks in memory, records calls, fails on demand.
pub struct MockTaskGateway {
    kind: BackendKind,
    pub tasks: Mutex<Vec<Task>>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: Mutex<HashSet<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub patches: Mutex<Vec<TaskPatch>>,
    pub created: Mutex<Vec<NewTask>>,
    pub list_calls: AtomicUsize,
}

impl MockTaskGateway {
    pub fn new(kind: BackendKind, tasks: Vec<Task>) -> Self {
        Self {
            kind,
            tasks: Mutex::new(tasks),
            fail_list: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
            patches: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn remote(tasks: Vec<Task>) -> Self {
        Self::new(BackendKind::Remote, tasks)
    }

    pub fn set_delay(&self, d: Duration) {
        *self.delay.lock() = Some(d);
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_delete.lock().insert(id.to_string());
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl TaskGateway for MockTaskGateway {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn list(&self, _owner: &str) -> Result<Vec<Task>, DomainError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        Ok(self.tasks.lock().clone())
    }

    async fn get(&self, _owner: &str, id: &str) -> Result<Task, DomainError> {
        self.tasks
            .lock()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DomainError::task_not_found(id))
    }

    async fn create(&self, owner: &str, new_task: NewTask) -> Result<Task, DomainError> {
        self.pause().await;
        self.created.lock().push(new_task.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DomainError::Timeout);
        }
        let task = Task {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            title: new_task.title,
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
            photo_uri: new_task.photo_uri,
            location: new_task.location,
        };
        self.tasks.lock().insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, _owner: &str, id: &str, patch: &TaskPatch) -> Result<Task, DomainError> {
        self.patches.lock().push(patch.clone());
        self.pause().await;
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::task_not_found(id))?;
        patch.apply_to(task);
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete(&self, _owner: &str, id: &str) -> Result<(), DomainError> {
        self.pause().await;
        if self.fail_delete.lock().contains(id) {
            return Err(DomainError::api(Some(500), "delete failed"));
        }
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(DomainError::task_not_found(id));
        }
        Ok(())
    }
}

// --- auth ---

pub struct MockAuth {
    pub login_result: Mutex<Result<AuthGrant, DomainError>>,
    pub me_result: Mutex<Result<User, DomainError>>,
    pub logins: AtomicUsize,
}

impl MockAuth {
    pub fn granting(user_id: Option<&str>, email: Option<&str>) -> Self {
        Self::with(Ok(AuthGrant {
            token: Some("tok-123".to_string()),
            user: Some(PartialUser {
                id: user_id.map(str::to_string),
                email: email.map(str::to_string),
                name: None,
            }),
        }))
    }

    pub fn with(login_result: Result<AuthGrant, DomainError>) -> Self {
        Self {
            login_result: Mutex::new(login_result),
            me_result: Mutex::new(Err(network_down())),
            logins: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthGateway for MockAuth {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.login_result.lock().clone()
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        self.login(credentials).await
    }

    async fn me(&self) -> Result<User, DomainError> {
        self.me_result.lock().clone()
    }
}

// --- storage ---

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn failing_writes() -> Self {
        let s = Self::default();
        s.fail_writes.store(true, Ordering::SeqCst);
        s
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::storage("disk unavailable"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::storage("disk full"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::storage("disk full"));
        }
        self.inner.remove(key).await
    }
}

// --- uploads and devices ---

pub struct MockUploader {
    pub fail: AtomicBool,
    pub uploads: Mutex<Vec<String>>,
}

impl MockUploader {
    pub fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageUploader for MockUploader {
    async fn upload(
        &self,
        local_ref: &str,
        _filename: Option<&str>,
    ) -> Result<UploadedImage, DomainError> {
        self.uploads.lock().push(local_ref.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::Timeout);
        }
        Ok(UploadedImage {
            url: "https://cdn.example.com/images/u1/img-1".to_string(),
            image_id: "img-1".to_string(),
        })
    }

    fn image_url(&self, user_id: &str, image_id: &str) -> String {
        format!("https://cdn.example.com/images/{}/{}", user_id, image_id)
    }

    async fn delete_image(&self, _user_id: &str, _image_id: &str) -> Result<(), DomainError> {
        Ok(())
    }
}

pub struct MockMedia {
    pub granted: bool,
    pub result: Result<Option<String>, DomainError>,
}

#[async_trait]
impl MediaDevice for MockMedia {
    async fn request_permission(&self, _source: MediaSource) -> Result<bool, DomainError> {
        Ok(self.granted)
    }

    async fn capture(&self, _source: MediaSource) -> Result<Option<String>, DomainError> {
        self.result.clone()
    }
}

pub struct MockLocation {
    pub granted: bool,
    pub places: Result<Vec<GeocodedPlace>, DomainError>,
}

#[async_trait]
impl LocationDevice for MockLocation {
    async fn request_permission(&self) -> Result<bool, DomainError> {
        Ok(self.granted)
    }

    async fn current_position(&self) -> Result<Coordinates, DomainError> {
        Ok(Coordinates {
            latitude: -33.45,
            longitude: -70.66,
        })
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<GeocodedPlace>, DomainError> {
        self.places.clone()
    }
}

// --- wiring ---

/// A session signed in as `OWNER`.
pub async fn signed_in_session() -> Arc<SessionStore> {
    let storage: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let auth = Arc::new(MockAuth::granting(Some(OWNER), Some("ana@example.com")));
    let session = Arc::new(SessionStore::new(storage, auth));
    session.initialize().await;
    session
        .login("ana@example.com", "secret")
        .await
        .expect("mock login succeeds");
    session
}

pub fn signed_out_session() -> Arc<SessionStore> {
    let storage: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let auth = Arc::new(MockAuth::granting(Some(OWNER), Some("ana@example.com")));
    Arc::new(SessionStore::new(storage, auth))
}

pub async fn store_with(
    gateway: Arc<MockTaskGateway>,
    uploader: Option<Arc<dyn ImageUploader>>,
) -> TaskStore {
    TaskStore::new(
        gateway,
        signed_in_session().await,
        uploader,
        TaskStoreConfig::default(),
    )
}
