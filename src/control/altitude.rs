//! Closed-loop altitude controller producing bounded velocity setpoints.
//!
//! The controller owns the latest vehicle state, the operator setpoint and a
//! [`PidRegulator`] for the vertical axis. Inputs are applied with
//! last-write-wins semantics through the `ingest_*` methods; [`AltitudeController::tick`]
//! is called once per control period and turns the stored state into a
//! [`CommandOutput`].
//!
//! ```no_run
//! use altitude_controller::{AltitudeController, ControllerConfig, Position};
//!
//! let mut controller = AltitudeController::new(&ControllerConfig::default()).unwrap();
//! controller.ingest_position(Position::new(0.0, 0.0, 0.8));
//! controller.ingest_setpoint(0.5, 0.0, 2.0);
//! let command = controller.tick();
//! assert!(command.vz <= 2.0);
//! ```

use log::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::control::pid::PidRegulator;
use crate::error::ConfigError;
use crate::types::{CommandOutput, Gains, LandedState, Position, Setpoint, TypeMask, VehicleState};

/// Whether the integrator may accumulate this tick: armed, airborne and in the
/// autonomous mode. Evaluated fresh every tick with no debouncing.
pub fn integral_gate_open(
    armed: bool,
    landed_state_code: u8,
    mode: &str,
    autonomous_mode: &str,
) -> bool {
    armed && landed_state_code > LandedState::ON_GROUND_CODE && mode == autonomous_mode
}

/// Per-tick values kept for monitoring. Not part of the published command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerTelemetry {
    pub altitude_error: f32,
    pub raw_command: f32,
    pub saturated: bool,
    pub integral_gate_open: bool,
    pub position_stale: bool,
}

#[derive(Debug, Clone)]
pub struct AltitudeController {
    // Limits and output metadata
    max_vup: f32,
    max_vdown: f32,
    autonomous_mode: String,
    position_timeout_ticks: Option<u32>,

    // Inputs
    position: Position,
    setpoint: Setpoint,
    vehicle: VehicleState,

    // Regulator and output
    pid: PidRegulator,
    output: CommandOutput,
    telemetry: ControllerTelemetry,
    ticks_since_position: u32,
}

impl AltitudeController {
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let gains = config.gains();
        let mut pid = PidRegulator::new(gains, config.sample_period)?;
        pid.set_target(config.altitude_setpoint);

        Ok(Self {
            max_vup: config.max_vup,
            max_vdown: config.max_vdown,
            autonomous_mode: config.autonomous_mode.clone(),
            position_timeout_ticks: config.position_timeout_ticks(),
            position: Position::default(),
            setpoint: Setpoint {
                altitude: config.altitude_setpoint,
                vx: 0.0,
                vy: 0.0,
                gains,
            },
            vehicle: VehicleState::default(),
            pid,
            output: CommandOutput::new(config.coordinate_frame, TypeMask(config.type_mask)),
            telemetry: ControllerTelemetry::default(),
            ticks_since_position: 0,
        })
    }

    // ========================================================================
    // INPUTS
    // ========================================================================

    pub fn ingest_position(&mut self, position: Position) {
        if !position.z.is_finite() {
            warn!("Rejected position with non-finite altitude: {:?}", position);
            return;
        }
        self.position = position;
        if self.telemetry.position_stale {
            info!("Position updates resumed at z = {:.2} m", position.z);
        }
        self.ticks_since_position = 0;
    }

    pub fn ingest_setpoint(&mut self, vx: f32, vy: f32, altitude: f32) {
        if !(vx.is_finite() && vy.is_finite() && altitude.is_finite()) {
            warn!(
                "Rejected non-finite setpoint: vx = {}, vy = {}, altitude = {}",
                vx, vy, altitude
            );
            return;
        }
        self.setpoint.vx = vx;
        self.setpoint.vy = vy;
        self.setpoint.altitude = altitude;
    }

    pub fn ingest_vehicle_state(&mut self, mode: impl Into<String>, armed: bool) {
        let mode = mode.into();
        if mode != self.vehicle.mode || armed != self.vehicle.armed {
            debug!("Vehicle state: mode = {}, armed = {}", mode, armed);
        }
        self.vehicle.mode = mode;
        self.vehicle.armed = armed;
    }

    pub fn ingest_landing_state(&mut self, code: u8) {
        if code != self.vehicle.landed_state {
            debug!(
                "Landed state: {} -> {}",
                LandedState::from_code(self.vehicle.landed_state),
                LandedState::from_code(code)
            );
        }
        self.vehicle.landed_state = code;
    }

    /// Replaces all three gains before the next tick.
    pub fn ingest_gains(&mut self, gains: Gains) {
        if !gains.is_finite() {
            warn!("Rejected non-finite gains: {:?}", gains);
            return;
        }
        info!("Gains updated: kp = {}, ki = {}, kd = {}", gains.kp, gains.ki, gains.kd);
        self.setpoint.gains = gains;
        self.pid.set_gains(gains);
    }

    /// Live-tunable ascent/descent limits.
    pub fn set_rate_limits(&mut self, max_vup: f32, max_vdown: f32) -> Result<(), ConfigError> {
        for (name, value) in [("max_vup", max_vup), ("max_vdown", max_vdown)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidRateLimit { name, value });
            }
        }
        self.max_vup = max_vup;
        self.max_vdown = max_vdown;
        Ok(())
    }

    // ========================================================================
    // CONTROL STEP
    // ========================================================================

    pub fn tick(&mut self) -> CommandOutput {
        let stale = self.check_position_stale();
        self.ticks_since_position = self.ticks_since_position.saturating_add(1);

        let error = self.setpoint.altitude - self.position.z;
        self.pid.set_target(self.setpoint.altitude);

        let gate = !stale
            && integral_gate_open(
                self.vehicle.armed,
                self.vehicle.landed_state,
                &self.vehicle.mode,
                &self.autonomous_mode,
            );
        if gate != self.telemetry.integral_gate_open {
            debug!(
                "Integral gate {} (armed = {}, landed state = {}, mode = {})",
                if gate { "opened" } else { "closed" },
                self.vehicle.armed,
                LandedState::from_code(self.vehicle.landed_state),
                self.vehicle.mode
            );
        }
        self.pid.set_integral_enabled(gate);

        let raw = self.pid.advance(self.position.z);
        let vz = if stale {
            0.0
        } else if raw.is_nan() {
            warn!(
                "Regulator produced NaN (error = {}), commanding zero vertical velocity",
                error
            );
            0.0
        } else {
            raw.clamp(-self.max_vdown, self.max_vup)
        };
        let saturated = !stale && vz != raw;
        if saturated && !self.telemetry.saturated {
            debug!("Vertical command saturated: raw = {:.3}, limited to {:.3}", raw, vz);
        }

        self.output.vx = self.setpoint.vx;
        self.output.vy = self.setpoint.vy;
        self.output.vz = vz;
        self.output.yaw = 0.0;
        self.output.sequence_id += 1;

        self.telemetry = ControllerTelemetry {
            altitude_error: error,
            raw_command: raw,
            saturated,
            integral_gate_open: gate,
            position_stale: stale,
        };

        self.output
    }

    fn check_position_stale(&self) -> bool {
        let Some(limit) = self.position_timeout_ticks else {
            return false;
        };
        // Stale once the count reaches the limit
        let stale = self.ticks_since_position >= limit;
        if stale && !self.telemetry.position_stale {
            warn!(
                "No position update for {} ticks, holding vertical command at zero",
                self.ticks_since_position
            );
        }
        stale
    }

    /// Clears the integrator and derivative history. Gating only ever freezes them.
    pub fn reset_regulator(&mut self) {
        self.pid.reset();
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn setpoint(&self) -> Setpoint {
        self.setpoint
    }

    pub fn vehicle_state(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn regulator(&self) -> &PidRegulator {
        &self.pid
    }

    pub fn telemetry(&self) -> ControllerTelemetry {
        self.telemetry
    }

    pub fn last_command(&self) -> CommandOutput {
        self.output
    }

    pub fn rate_limits(&self) -> (f32, f32) {
        (self.max_vup, self.max_vdown)
    }
}
