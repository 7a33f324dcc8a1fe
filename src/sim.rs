//! Simulated vehicle used to drive the controller without an autopilot.

pub mod vehicle;

pub use vehicle::SimulatedVehicle;
