use serde::Deserialize;

use crate::domain::error::DomainError;

/// Uniform response wrapper of the todo API: `{ success, data?, error?, count? }`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> ApiEnvelope<T> {
    /// The payload, or an error carrying the server's message when it sent one.
    pub fn into_result(self, operation: &str) -> Result<T, DomainError> {
        if self.success == Some(false) {
            return Err(DomainError::api(
                None,
                self.error
                    .unwrap_or_else(|| format!("{} failed", operation)),
            ));
        }
        self.data.ok_or_else(|| {
            DomainError::malformed(
                self.error
                    .unwrap_or_else(|| format!("no data in {} response", operation)),
            )
        })
    }

    /// For endpoints whose payload is irrelevant.
    pub fn into_unit(self, operation: &str) -> Result<(), DomainError> {
        if self.success == Some(false) {
            return Err(DomainError::api(
                None,
                self.error
                    .unwrap_or_else(|| format!("{} failed", operation)),
            ));
        }
        Ok(())
    }
}

/// Error text from a failed response body, if it is an envelope with `error`.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|env| env.error)
        .filter(|e| !e.trim().is_empty())
}
