use async_trait::async_trait;

use crate::contract::model::MediaSource;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One reverse-geocoding candidate; every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodedPlace {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Camera and photo library prompts.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// `Ok(false)` when the user declined.
    async fn request_permission(&self, source: MediaSource) -> Result<bool, DomainError>;
    /// `Ok(None)` when the user cancelled the picker.
    async fn capture(&self, source: MediaSource) -> Result<Option<String>, DomainError>;
}

#[async_trait]
pub trait LocationDevice: Send + Sync {
    async fn request_permission(&self) -> Result<bool, DomainError>;
    async fn current_position(&self) -> Result<Coordinates, DomainError>;
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Vec<GeocodedPlace>, DomainError>;
}
