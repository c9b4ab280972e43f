use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One element of the JSON array stored under the `todos` key.
///
/// Aliases accept records written by the older local-only app revision
/// (`username`, `imageUri`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTask {
    pub id: String,
    #[serde(alias = "username", alias = "userId")]
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "imageUri", skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<StoredLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
