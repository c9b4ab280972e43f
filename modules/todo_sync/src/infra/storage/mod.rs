pub mod entity;
pub mod json_file;
pub mod local_tasks;
pub mod mapper;
pub mod memory;
pub mod offline_auth;

pub use json_file::JsonFileStore;
pub use local_tasks::LocalTaskGateway;
pub use memory::InMemoryStore;
pub use offline_auth::OfflineAuthGateway;
