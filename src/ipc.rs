//! IPC module - Input event queue, command channel and shared controller state

pub mod channels;
pub mod shared_resource;

pub use channels::{ControllerChannels, InputEvent};
pub use shared_resource::{ConfigBuffer, RateLimits, SharedController};
