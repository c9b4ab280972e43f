// === PUBLIC CONTRACT ===
// Only the contract module should be public for other crates to consume
pub mod contract;

// Re-export the public contract components
pub use contract::{error, model};

// === CONTEXT ===
// The single object that owns every store for the lifetime of the process
pub mod context;
pub use context::{Devices, Gateways, TodoSyncContext};
pub use config::TodoSyncConfig;

pub mod config;

// === INTERNAL MODULES ===
// WARNING: These modules are internal implementation details!
// They are exposed only for comprehensive testing and for wiring adapters.
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
