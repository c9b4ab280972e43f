use async_trait::async_trait;

use crate::contract::model::UploadedImage;
use crate::domain::error::DomainError;

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload a local image reference; `filename` defaults to `photo_<millis>.<ext>`.
    async fn upload(
        &self,
        local_ref: &str,
        filename: Option<&str>,
    ) -> Result<UploadedImage, DomainError>;

    /// Public URL of a previously uploaded image.
    fn image_url(&self, user_id: &str, image_id: &str) -> String;

    async fn delete_image(&self, user_id: &str, image_id: &str) -> Result<(), DomainError>;
}
