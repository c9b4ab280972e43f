use chrono::{DateTime, Utc};

/// Signed-in identity (no serde; wire and storage shapes live in `infra`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<String>,
    pub email: String,
    pub name: Option<String>,
}

impl User {
    /// Identity used to partition task data: the server id when known, else the email.
    pub fn owner_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.email)
    }
}

/// Read-only view of the session for UI consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_loading: bool,
    /// `None` while authenticated means "authenticated but user unknown".
    pub user: Option<User>,
}

impl SessionSnapshot {
    pub fn owner_key(&self) -> Option<&str> {
        self.user.as_ref().map(User::owner_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Result of a login or registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: Option<String>,
    pub user: Option<PartialUser>,
}

/// User fields as returned by auth endpoints, any of which may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub photo_uri: Option<String>,
    pub location: Option<TodoLocation>,
}

/// Data for creating a task. `title` is already trimmed and non-blank.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    pub title: String,
    pub photo_uri: Option<String>,
    pub location: Option<TodoLocation>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub photo_uri: Option<String>,
    pub location: Option<TodoLocation>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.photo_uri.is_none()
            && self.location.is_none()
    }

    /// Apply the supplied fields to `task` in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(photo_uri) = &self.photo_uri {
            task.photo_uri = Some(photo_uri.clone());
        }
        if let Some(location) = &self.location {
            task.location = Some(location.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub image_id: String,
}

/// A photo reference plus the location captured alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub photo_uri: String,
    pub location: Option<TodoLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    Camera,
    Gallery,
}

/// Outcome of a bulk clear: ids removed and ids that stayed because their delete failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}
