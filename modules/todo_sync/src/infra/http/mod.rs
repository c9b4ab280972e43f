pub mod auth;
pub mod client;
pub mod dto;
pub mod envelope;
pub mod images;
pub mod tasks;
pub mod trace;

pub use auth::HttpAuthGateway;
pub use client::ApiClient;
pub use images::HttpImageUploader;
pub use tasks::HttpTaskGateway;
