pub mod async_impl;
pub mod benchmark;
pub mod config;
pub mod control;
pub mod error;
pub mod ipc;
pub mod runtime;
pub mod sim;
pub mod threaded_impl;
pub mod types;

pub use benchmark::{MetricsReport, TimingMetrics};
pub use config::{load_config, parse_config, ControllerConfig, PidConfig};
pub use control::{integral_gate_open, AltitudeController, ControllerTelemetry, PidRegulator};
pub use error::{ConfigError, LoopError};
pub use ipc::{ConfigBuffer, ControllerChannels, InputEvent, RateLimits, SharedController};
pub use runtime::LoopStats;
pub use sim::SimulatedVehicle;
pub use types::{CommandOutput, Gains, LandedState, Position, Setpoint, TypeMask, VehicleState};
