use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::media::DEFAULT_UNKNOWN_LOCATION;
use crate::domain::ports::BackendKind;

pub const MODULE_NAME: &str = "todo_sync";

/// Configuration for the todo_sync module (`modules.todo_sync`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TodoSyncConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub api: ApiConfig,
    /// Key-value storage file, relative to the app home dir unless absolute.
    #[serde(default = "default_storage_file")]
    pub storage_file: String,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "default_unknown_location_label")]
    pub unknown_location_label: String,
}

impl Default for TodoSyncConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            api: ApiConfig::default(),
            storage_file: default_storage_file(),
            max_title_length: default_max_title_length(),
            unknown_location_label: default_unknown_location_label(),
        }
    }
}

impl TodoSyncConfig {
    pub fn storage_path(&self, home_dir: &Path) -> PathBuf {
        let p = PathBuf::from(&self.storage_file);
        if p.is_absolute() {
            p
        } else {
            home_dir.join(p)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_title_length == 0 {
            return Err("max_title_length must be greater than 0".into());
        }
        if self.storage_file.trim().is_empty() {
            return Err("storage_file cannot be empty".into());
        }
        if self.backend == BackendKind::Remote {
            let url = url::Url::parse(&self.api.base_url)
                .map_err(|e| format!("api.base_url: {}", e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("api.base_url: unsupported scheme '{}'", url.scheme()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default = "default_upload_timeout", with = "humantime_serde")]
    pub upload_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            upload_timeout: default_upload_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://todo-list.dobleb.cl".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_storage_file() -> String {
    "storage.json".to_string()
}

fn default_max_title_length() -> usize {
    500
}

fn default_unknown_location_label() -> String {
    DEFAULT_UNKNOWN_LOCATION.to_string()
}
