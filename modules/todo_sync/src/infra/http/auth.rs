use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use crate::contract::model::{AuthGrant, Credentials, User};
use crate::domain::error::DomainError;
use crate::domain::ports::AuthGateway;
use crate::infra::http::client::ApiClient;
use crate::infra::http::dto::{AuthDataDto, CredentialsDto, UserDto};

/// `POST /auth/login`, `POST /auth/register`, `GET /users/me`.
pub struct HttpAuthGateway {
    client: Arc<ApiClient>,
}

impl HttpAuthGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn post_credentials(
        &self,
        segments: &[&str],
        credentials: &Credentials,
        operation: &str,
    ) -> Result<AuthGrant, DomainError> {
        let url = self.client.endpoint(segments)?;
        let body = CredentialsDto {
            email: &credentials.email,
            password: &credentials.password,
        };
        let data = self
            .client
            .send::<AuthDataDto>(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_result(operation)?;
        Ok(data.into())
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    #[instrument(name = "todo_sync.http.auth.login", skip_all, fields(base = %self.client.base_url()))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        self.post_credentials(&["auth", "login"], credentials, "login")
            .await
    }

    #[instrument(name = "todo_sync.http.auth.register", skip_all, fields(base = %self.client.base_url()))]
    async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, DomainError> {
        self.post_credentials(&["auth", "register"], credentials, "register")
            .await
    }

    #[instrument(name = "todo_sync.http.auth.me", skip_all)]
    async fn me(&self) -> Result<User, DomainError> {
        let url = self.client.endpoint(&["users", "me"])?;
        let dto = self
            .client
            .send::<UserDto>(self.client.request(Method::GET, url))
            .await?
            .into_result("profile")?;
        User::try_from(dto)
    }
}
