use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::contract::model::UploadedImage;
use crate::domain::error::DomainError;
use crate::domain::ports::ImageUploader;
use crate::infra::http::client::ApiClient;
use crate::infra::http::dto::ImageDataDto;

const DEFAULT_EXTENSION: &str = "jpg";

/// `POST /images` (multipart field `image`) and `/images/{userId}/{imageId}`.
pub struct HttpImageUploader {
    client: Arc<ApiClient>,
}

impl HttpImageUploader {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

/// Filesystem path behind a local image reference (`file://` or bare path).
pub fn local_path(local_ref: &str) -> &Path {
    Path::new(local_ref.strip_prefix("file://").unwrap_or(local_ref))
}

/// Lower-cased extension of the reference, `jpg` when there is none.
pub fn extension_of(local_ref: &str) -> String {
    local_path(local_ref)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

pub fn default_filename(local_ref: &str) -> String {
    format!(
        "photo_{}.{}",
        Utc::now().timestamp_millis(),
        extension_of(local_ref)
    )
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
    #[instrument(name = "todo_sync.http.images.upload", skip(self), fields(base = %self.client.base_url()))]
    async fn upload(
        &self,
        local_ref: &str,
        filename: Option<&str>,
    ) -> Result<UploadedImage, DomainError> {
        let path = local_path(local_ref);
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DomainError::validation("image", format!("cannot read {}: {}", path.display(), e))
        })?;

        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| default_filename(local_ref));
        let mime = format!("image/{}", extension_of(&filename));
        debug!(%filename, %mime, size = bytes.len(), "Uploading image");

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(&mime)
            .map_err(|e| DomainError::validation("image", e.to_string()))?;
        let form = Form::new().part("image", part);

        let url = self.client.endpoint(&["images"])?;
        let data = self
            .client
            .send::<ImageDataDto>(self.client.upload_request(Method::POST, url).multipart(form))
            .await?
            .into_result("image upload")?;

        let mut uploaded = UploadedImage::from(data);
        uploaded.url = self.client.absolute(&uploaded.url);
        Ok(uploaded)
    }

    fn image_url(&self, user_id: &str, image_id: &str) -> String {
        match self.client.endpoint(&["images", user_id, image_id]) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}/images/{}/{}",
                self.client.base_url().as_str().trim_end_matches('/'),
                user_id,
                image_id
            ),
        }
    }

    #[instrument(name = "todo_sync.http.images.delete", skip(self))]
    async fn delete_image(&self, user_id: &str, image_id: &str) -> Result<(), DomainError> {
        let url = self.client.endpoint(&["images", user_id, image_id])?;
        self.client
            .send::<serde_json::Value>(self.client.request(Method::DELETE, url))
            .await?
            .into_unit("image delete")
    }
}
