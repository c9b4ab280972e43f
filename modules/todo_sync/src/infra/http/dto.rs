//! Wire shapes of the todo API (camelCase JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::model::{
    AuthGrant, NewTask, PartialUser, Task, TaskPatch, TodoLocation, UploadedImage, User,
};
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub location: Option<LocationDto>,
    #[serde(default)]
    pub photo_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskDto {
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
}

/// PATCH body; absent fields are left unchanged by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsDto<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthDataDto {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDataDto {
    pub url: String,
    #[serde(alias = "id")]
    pub image_id: String,
}

// --- mappers ---

impl From<LocationDto> for TodoLocation {
    fn from(l: LocationDto) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            address: l.address,
        }
    }
}

impl From<TodoLocation> for LocationDto {
    fn from(l: TodoLocation) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            address: l.address,
        }
    }
}

impl TaskDto {
    /// `owner` fills in `userId` when the server leaves it out.
    pub fn into_task(self, owner: &str) -> Task {
        Task {
            id: self.id,
            owner_id: self.user_id.unwrap_or_else(|| owner.to_string()),
            title: self.title,
            completed: self.completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            photo_uri: self.photo_uri,
            location: self.location.map(Into::into),
        }
    }
}

impl From<NewTask> for CreateTaskDto {
    fn from(t: NewTask) -> Self {
        Self {
            title: t.title,
            completed: false,
            location: t.location.map(Into::into),
            photo_uri: t.photo_uri,
        }
    }
}

impl From<&TaskPatch> for UpdateTaskDto {
    fn from(p: &TaskPatch) -> Self {
        Self {
            title: p.title.clone(),
            completed: p.completed,
            location: p.location.clone().map(Into::into),
            photo_uri: p.photo_uri.clone(),
        }
    }
}

impl From<UserDto> for PartialUser {
    fn from(u: UserDto) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = DomainError;

    fn try_from(u: UserDto) -> Result<Self, Self::Error> {
        let email = u
            .email
            .ok_or_else(|| DomainError::malformed("user record without email"))?;
        Ok(Self {
            id: u.id,
            email,
            name: u.name,
        })
    }
}

impl From<AuthDataDto> for AuthGrant {
    fn from(d: AuthDataDto) -> Self {
        Self {
            token: d.token,
            user: d.user.map(Into::into),
        }
    }
}

impl From<ImageDataDto> for UploadedImage {
    fn from(d: ImageDataDto) -> Self {
        Self {
            url: d.url,
            image_id: d.image_id,
        }
    }
}
