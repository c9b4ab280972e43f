pub mod auth;
pub mod device;
pub mod images;
pub mod storage;
pub mod tasks;

pub use auth::AuthGateway;
pub use device::{Coordinates, GeocodedPlace, LocationDevice, MediaDevice};
pub use images::ImageUploader;
pub use storage::KeyValueStore;
pub use tasks::{BackendKind, TaskGateway};
