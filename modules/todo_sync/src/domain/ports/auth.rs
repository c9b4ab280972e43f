use async_trait::async_trait;

use crate::contract::model::{AuthGrant, Credentials, User};
use crate::domain::error::DomainError;

/// Authentication endpoints of the backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError>;
    async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError>;
    /// Profile of the bearer of the current token.
    async fn me(&self) -> Result<User, DomainError>;
}
