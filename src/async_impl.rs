//! Control loop as a tokio task.

pub mod control_task;

pub use control_task::control_task;
