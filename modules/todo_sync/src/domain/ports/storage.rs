use async_trait::async_trait;

use crate::domain::error::DomainError;

/// Well-known keys in the process-wide storage key space.
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const AUTH_USER: &str = "authUser";
    /// JSON array holding every user's tasks (local backend).
    pub const TODOS: &str = "todos";
}

/// Port for the device key-value store (string keys, string values).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), DomainError>;
}
