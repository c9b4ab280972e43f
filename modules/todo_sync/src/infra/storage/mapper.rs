use crate::contract::model::{Task, TodoLocation};
use crate::infra::storage::entity::{StoredLocation, StoredTask};

impl From<StoredLocation> for TodoLocation {
    fn from(l: StoredLocation) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            address: l.address,
        }
    }
}

impl From<TodoLocation> for StoredLocation {
    fn from(l: TodoLocation) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            address: l.address,
        }
    }
}

impl From<StoredTask> for Task {
    fn from(s: StoredTask) -> Self {
        Self {
            id: s.id,
            owner_id: s.owner_id,
            title: s.title,
            completed: s.completed,
            created_at: s.created_at,
            updated_at: s.updated_at,
            photo_uri: s.photo_uri,
            location: s.location.map(Into::into),
        }
    }
}

impl From<Task> for StoredTask {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            title: t.title,
            completed: t.completed,
            created_at: t.created_at,
            updated_at: t.updated_at,
            photo_uri: t.photo_uri,
            location: t.location.map(Into::into),
        }
    }
}
