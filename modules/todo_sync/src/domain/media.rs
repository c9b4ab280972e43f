use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::contract::model::{Attachment, MediaSource, TodoLocation, UploadedImage};
use crate::domain::error::DomainError;
use crate::domain::ports::{GeocodedPlace, ImageUploader, LocationDevice, MediaDevice};

pub const DEFAULT_UNKNOWN_LOCATION: &str = "Unknown location";

/// Turns "take photo" / "pick from gallery" intents into attachments.
///
/// Declined permissions and device failures yield `None`: the caller
/// continues without an attachment.
pub struct MediaResolver {
    media: Arc<dyn MediaDevice>,
    location: Arc<dyn LocationDevice>,
    uploader: Option<Arc<dyn ImageUploader>>,
    unknown_location_label: String,
}

impl MediaResolver {
    pub fn new(
        media: Arc<dyn MediaDevice>,
        location: Arc<dyn LocationDevice>,
        uploader: Option<Arc<dyn ImageUploader>>,
        unknown_location_label: impl Into<String>,
    ) -> Self {
        Self {
            media,
            location,
            uploader,
            unknown_location_label: unknown_location_label.into(),
        }
    }

    pub async fn capture_from_camera(&self) -> Option<String> {
        self.capture(MediaSource::Camera).await
    }

    pub async fn capture_from_gallery(&self) -> Option<String> {
        self.capture(MediaSource::Gallery).await
    }

    #[instrument(name = "todo_sync.media.capture", skip(self))]
    pub async fn capture(&self, source: MediaSource) -> Option<String> {
        match self.media.request_permission(source).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Media permission declined");
                return None;
            }
            Err(e) => {
                warn!("Media permission request failed: {}", e);
                return None;
            }
        }

        match self.media.capture(source).await {
            Ok(Some(local_ref)) => {
                debug!(local_ref = %local_ref, "Captured image");
                Some(local_ref)
            }
            Ok(None) => {
                debug!("Capture cancelled");
                None
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                None
            }
        }
    }

    /// Current coordinates plus a best-effort address.
    #[instrument(name = "todo_sync.media.resolve_location", skip(self))]
    pub async fn resolve_location(&self) -> Option<TodoLocation> {
        match self.location.request_permission().await {
            Ok(true) => {}
            Ok(false) => {
                info!("Location permission declined");
                return None;
            }
            Err(e) => {
                warn!("Location permission request failed: {}", e);
                return None;
            }
        }

        let at = match self.location.current_position().await {
            Ok(at) => at,
            Err(e) => {
                warn!("Failed to get current position: {}", e);
                return None;
            }
        };

        let places = match self.location.reverse_geocode(at).await {
            Ok(places) => places,
            Err(e) => {
                debug!("Reverse geocoding failed: {}", e);
                Vec::new()
            }
        };

        let address = places
            .first()
            .map(format_address)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.unknown_location_label.clone());

        Some(TodoLocation {
            latitude: at.latitude,
            longitude: at.longitude,
            address: Some(address),
        })
    }

    /// Capture a photo and, if one was taken, tag it with the current location.
    pub async fn capture_with_location(&self, source: MediaSource) -> Option<Attachment> {
        let photo_uri = self.capture(source).await?;
        let location = self.resolve_location().await;
        Some(Attachment {
            photo_uri,
            location,
        })
    }

    #[instrument(name = "todo_sync.media.upload_image", skip(self))]
    pub async fn upload_image(&self, local_ref: &str) -> Result<UploadedImage, DomainError> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| DomainError::validation("image", "uploads need the remote backend"))?;
        uploader.upload(local_ref, None).await
    }
}

/// `"{city}, {region}, {country}"` with missing parts left empty, trimmed.
pub fn format_address(place: &GeocodedPlace) -> String {
    let part = |p: &Option<String>| p.clone().unwrap_or_default();
    let joined = format!(
        "{}, {}, {}",
        part(&place.city),
        part(&place.region),
        part(&place.country)
    );
    // nothing but separators means geocoding gave us nothing
    if joined.chars().all(|c| c == ',' || c.is_whitespace()) {
        return String::new();
    }
    joined.trim().to_string()
}

/// Whether a photo reference already points at the server.
pub fn is_remote_uri(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Photo reference to persist with a task.
///
/// With an uploader, local references are uploaded and replaced by the
/// canonical URL; an upload failure drops the photo instead of failing the
/// enclosing task operation. Without an uploader the local reference is kept.
pub async fn prepare_photo(
    uploader: Option<&dyn ImageUploader>,
    photo_uri: Option<String>,
) -> Option<String> {
    let photo_uri = photo_uri.filter(|p| !p.trim().is_empty())?;
    let Some(uploader) = uploader else {
        return Some(photo_uri);
    };
    if is_remote_uri(&photo_uri) {
        return Some(photo_uri);
    }

    match uploader.upload(&photo_uri, None).await {
        Ok(uploaded) => {
            debug!(url = %uploaded.url, "Photo uploaded");
            Some(uploaded.url)
        }
        Err(e) => {
            warn!("Photo upload failed, continuing without photo: {}", e);
            None
        }
    }
}
