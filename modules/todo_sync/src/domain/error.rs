use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Title cannot be blank")]
    BlankTitle,

    #[error("Title too long: {len} characters (max: {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Permission denied: {capability}")]
    PermissionDenied { capability: String },

    #[error("Invalid state transition: {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl DomainError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    pub fn title_too_long(len: usize, max: usize) -> Self {
        Self::TitleTooLong { len, max }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn permission_denied(capability: impl Into<String>) -> Self {
        Self::PermissionDenied {
            capability: capability.into(),
        }
    }

    /// Network-class failures: the backend could not be reached or answered badly.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout | Self::MalformedResponse { .. }
        )
    }
}
