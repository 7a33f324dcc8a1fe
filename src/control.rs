//! Control law: the vertical PID regulator and the altitude controller built on it.

pub mod altitude;
pub mod pid;

pub use altitude::{integral_gate_open, AltitudeController, ControllerTelemetry};
pub use pid::PidRegulator;
