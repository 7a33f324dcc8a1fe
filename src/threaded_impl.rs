//! Control loop on a dedicated OS thread.

pub mod control_thread;

pub use control_thread::spawn_control_thread;
