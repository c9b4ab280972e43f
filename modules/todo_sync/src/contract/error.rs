use thiserror::Error;

/// Errors that are safe to expose to consumers of the crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoSyncError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Task not found: {id}")]
    NotFound { id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Internal error")]
    Internal,
}

impl TodoSyncError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for TodoSyncError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            NotAuthenticated => Self::Unauthenticated,
            TaskNotFound { id } => Self::not_found(id),
            BlankTitle => Self::validation("Title cannot be blank"),
            TitleTooLong { len, max } => Self::validation(format!(
                "Title too long: {} characters (max: {})",
                len, max
            )),
            Validation { field, message } => Self::validation(format!("{}: {}", field, message)),
            PermissionDenied { capability } => {
                Self::validation(format!("Permission denied: {}", capability))
            }
            Network { message } => Self::backend(message),
            Timeout => Self::backend("Request timed out"),
            Api { message, .. } => Self::backend(message),
            MalformedResponse { .. } => Self::backend("Unexpected response from server"),
            Storage { .. } | InvalidTransition { .. } => Self::internal(),
        }
    }
}
