use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::contract::model::{AuthGrant, Credentials, PartialUser, User};
use crate::domain::error::DomainError;
use crate::domain::ports::AuthGateway;

/// Sign-in for the local backend: no server, any non-blank email is accepted.
///
/// The email becomes the user id so that local tasks are partitioned by it.
#[derive(Default)]
pub struct OfflineAuthGateway;

impl OfflineAuthGateway {
    pub fn new() -> Self {
        Self
    }

    fn grant(credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        let email = credentials.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("email", "cannot be empty"));
        }
        Ok(AuthGrant {
            token: Some(format!("local-{}", Uuid::new_v4())),
            user: Some(PartialUser {
                id: Some(email.to_string()),
                email: Some(email.to_string()),
                name: None,
            }),
        })
    }
}

#[async_trait]
impl AuthGateway for OfflineAuthGateway {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        let grant = Self::grant(credentials)?;
        info!("Offline sign-in");
        Ok(grant)
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        Self::grant(credentials)
    }

    async fn me(&self) -> Result<User, DomainError> {
        Err(DomainError::validation(
            "backend",
            "profile refresh needs the remote backend",
        ))
    }
}
