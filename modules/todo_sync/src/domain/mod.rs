pub mod error;
pub mod locks;
pub mod media;
pub mod phase;
pub mod ports;
pub mod session;
pub mod task_store;
