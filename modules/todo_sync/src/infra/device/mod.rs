pub mod preset;

pub use preset::{PresetLocationDevice, PresetMediaDevice};
