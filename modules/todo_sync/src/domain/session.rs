use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{AuthGrant, Credentials, SessionSnapshot, User};
use crate::domain::error::DomainError;
use crate::domain::ports::storage::keys;
use crate::domain::ports::{AuthGateway, KeyValueStore};

/// Persisted shape of the signed-in user under `authUser`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    // the local-only revision stored `{ "username": ... }`
    #[serde(alias = "username")]
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&User> for StoredUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
        }
    }
}

impl From<StoredUser> for User {
    fn from(s: StoredUser) -> Self {
        Self {
            id: s.id,
            email: s.email,
            name: s.name,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    is_authenticated: bool,
    is_loading: bool,
    user: Option<User>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
        }
    }
}

/// Authenticated identity for the current process run.
///
/// The bearer token itself is never held in memory; HTTP adapters read it
/// from storage on every request.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    auth: Arc<dyn AuthGateway>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, auth: Arc<dyn AuthGateway>) -> Self {
        Self {
            storage,
            auth,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.read();
        SessionSnapshot {
            is_authenticated: s.is_authenticated,
            is_loading: s.is_loading,
            user: s.user.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Restore the session persisted by a previous run.
    ///
    /// Never fails: storage errors leave the session signed out, and
    /// `is_loading` is cleared in every case.
    #[instrument(name = "todo_sync.session.initialize", skip(self))]
    pub async fn initialize(&self) -> SessionSnapshot {
        let restored = self.restore().await;

        {
            let mut s = self.state.write();
            match restored {
                Ok((true, user)) => {
                    s.is_authenticated = true;
                    s.user = user;
                }
                Ok((false, _)) => {
                    s.is_authenticated = false;
                    s.user = None;
                }
                Err(e) => {
                    warn!("Failed to restore session: {}", e);
                    s.is_authenticated = false;
                    s.user = None;
                }
            }
            s.is_loading = false;
        }

        let snap = self.snapshot();
        info!(
            authenticated = snap.is_authenticated,
            user_known = snap.user.is_some(),
            "Session initialized"
        );
        snap
    }

    async fn restore(&self) -> Result<(bool, Option<User>), DomainError> {
        let token = self.storage.get(keys::AUTH_TOKEN).await?;
        if token.is_none() {
            return Ok((false, None));
        }
        let user = self.read_stored_user().await;
        if user.is_none() {
            debug!("Token present but no stored user record");
        }
        Ok((true, user))
    }

    /// Stored user record, treating unreadable or malformed records as absent.
    async fn read_stored_user(&self) -> Option<User> {
        let raw = match self.storage.get(keys::AUTH_USER).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read stored user: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<StoredUser>(&raw) {
            Ok(stored) => Some(stored.into()),
            Err(e) => {
                warn!("Ignoring malformed stored user record: {}", e);
                None
            }
        }
    }

    #[instrument(name = "todo_sync.session.login", skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionSnapshot, DomainError> {
        let credentials = validate_credentials(email, password)?;
        let grant = self.auth.login(&credentials).await?;
        self.establish(&credentials, grant).await
    }

    #[instrument(name = "todo_sync.session.register", skip(self, email, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionSnapshot, DomainError> {
        let credentials = validate_credentials(email, password)?;
        let grant = self.auth.register(&credentials).await?;
        if grant.token.as_deref().is_some_and(|t| !t.trim().is_empty()) {
            return self.establish(&credentials, grant).await;
        }

        // account created without a session; the caller signs in separately
        if let Some(partial) = grant.user {
            if let (Some(id), Some(email)) = (partial.id, partial.email) {
                self.persist_user(&User {
                    id: Some(id),
                    email,
                    name: partial.name,
                })
                .await;
            }
        }
        info!("Registered without a session token");
        Ok(self.snapshot())
    }

    /// Persist a successful grant and switch the in-memory session to signed in.
    /// Storage failures are logged; memory still reflects the sign-in.
    async fn establish(
        &self,
        credentials: &Credentials,
        grant: AuthGrant,
    ) -> Result<SessionSnapshot, DomainError> {
        let token = grant
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DomainError::malformed("no token in auth response"))?;

        if let Err(e) = self.storage.set(keys::AUTH_TOKEN, &token).await {
            warn!("Failed to persist auth token: {}", e);
        }

        let partial = grant.user.unwrap_or_default();
        let user = User {
            id: partial.id,
            email: partial.email.unwrap_or_else(|| credentials.email.clone()),
            name: partial.name,
        };

        if user.id.is_some() {
            self.persist_user(&user).await;
        } else {
            warn!("Auth response carried no user id; user record not stored");
        }

        {
            let mut s = self.state.write();
            s.is_authenticated = true;
            s.is_loading = false;
            s.user = Some(user);
        }
        info!("Signed in");
        Ok(self.snapshot())
    }

    async fn persist_user(&self, user: &User) {
        let stored = StoredUser::from(user);
        match serde_json::to_string(&stored) {
            Ok(json) => {
                if let Err(e) = self.storage.set(keys::AUTH_USER, &json).await {
                    warn!("Failed to persist user record: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode user record: {}", e),
        }
    }

    /// Sign out. Storage cleanup is best-effort and never blocks the in-memory transition.
    #[instrument(name = "todo_sync.session.logout", skip(self))]
    pub async fn logout(&self) -> SessionSnapshot {
        for key in [keys::AUTH_TOKEN, keys::AUTH_USER] {
            if let Err(e) = self.storage.remove(key).await {
                warn!(key, "Failed to clear stored credential: {}", e);
            }
        }

        {
            let mut s = self.state.write();
            s.is_authenticated = false;
            s.is_loading = false;
            s.user = None;
        }
        info!("Signed out");
        self.snapshot()
    }

    /// Re-read the stored user record without touching the network.
    #[instrument(name = "todo_sync.session.fetch_user", skip(self))]
    pub async fn fetch_user(&self) -> Option<User> {
        if !self.is_authenticated() {
            self.state.write().user = None;
            return None;
        }

        let user = self.read_stored_user().await;
        self.state.write().user = user.clone();
        user
    }

    /// Refresh the profile from the backend and store it; the previous user is kept on failure.
    #[instrument(name = "todo_sync.session.refresh_profile", skip(self))]
    pub async fn refresh_profile(&self) -> Result<User, DomainError> {
        if !self.is_authenticated() {
            return Err(DomainError::NotAuthenticated);
        }

        let user = self.auth.me().await?;
        self.persist_user(&user).await;
        self.state.write().user = Some(user.clone());
        debug!("Profile refreshed");
        Ok(user)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<Credentials, DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::validation("email", "cannot be empty"));
    }
    if password.is_empty() {
        return Err(DomainError::validation("password", "cannot be empty"));
    }
    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
