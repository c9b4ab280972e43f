//! Device adapters for headless use: media and location are supplied up front
//! (e.g. from command-line flags) instead of prompting a user.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::contract::model::MediaSource;
use crate::domain::error::DomainError;
use crate::domain::ports::{Coordinates, GeocodedPlace, LocationDevice, MediaDevice};

/// Returns a fixed file for each source. A source without a file counts as declined.
#[derive(Debug, Clone, Default)]
pub struct PresetMediaDevice {
    pub camera: Option<PathBuf>,
    pub gallery: Option<PathBuf>,
}

impl PresetMediaDevice {
    pub fn gallery(path: impl Into<PathBuf>) -> Self {
        Self {
            camera: None,
            gallery: Some(path.into()),
        }
    }

    fn source(&self, source: MediaSource) -> Option<&PathBuf> {
        match source {
            MediaSource::Camera => self.camera.as_ref(),
            MediaSource::Gallery => self.gallery.as_ref(),
        }
    }
}

#[async_trait]
impl MediaDevice for PresetMediaDevice {
    async fn request_permission(&self, source: MediaSource) -> Result<bool, DomainError> {
        Ok(self.source(source).is_some())
    }

    async fn capture(&self, source: MediaSource) -> Result<Option<String>, DomainError> {
        let Some(path) = self.source(source) else {
            return Ok(None);
        };
        let absolute = std::path::absolute(path).map_err(|e| {
            DomainError::validation("photo", format!("{}: {}", path.display(), e))
        })?;
        if !absolute.is_file() {
            return Err(DomainError::validation(
                "photo",
                format!("{} is not a file", absolute.display()),
            ));
        }
        debug!(path = %absolute.display(), "Using preset image");
        Ok(Some(format!("file://{}", absolute.display())))
    }
}

/// Fixed position with an optional place for reverse geocoding.
#[derive(Debug, Clone, Default)]
pub struct PresetLocationDevice {
    pub position: Option<Coordinates>,
    pub place: Option<GeocodedPlace>,
}

impl PresetLocationDevice {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Some(Coordinates {
                latitude,
                longitude,
            }),
            place: None,
        }
    }
}

#[async_trait]
impl LocationDevice for PresetLocationDevice {
    async fn request_permission(&self) -> Result<bool, DomainError> {
        Ok(self.position.is_some())
    }

    async fn current_position(&self) -> Result<Coordinates, DomainError> {
        self.position
            .ok_or_else(|| DomainError::permission_denied("location"))
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<GeocodedPlace>, DomainError> {
        Ok(self.place.clone().into_iter().collect())
    }
}
