use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::control::{AltitudeController, ControllerTelemetry};
use crate::error::ConfigError;
use crate::types::{CommandOutput, Gains, Position};

// ============================================================================
// SHARED CONTROLLER - Lock-serialized access for direct callers
// ============================================================================

/// Controller handle for callers that deliver inputs from their own threads
/// instead of going through [`super::ControllerChannels`]. Each call holds the
/// lock only for a field overwrite or a single tick, so a tick never observes a
/// half-applied update.
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<AltitudeController>>,
}

impl SharedController {
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_controller(AltitudeController::new(config)?))
    }

    pub fn from_controller(controller: AltitudeController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn ingest_position(&self, position: Position) {
        self.inner.lock().ingest_position(position);
    }

    pub fn ingest_setpoint(&self, vx: f32, vy: f32, altitude: f32) {
        self.inner.lock().ingest_setpoint(vx, vy, altitude);
    }

    pub fn ingest_vehicle_state(&self, mode: impl Into<String>, armed: bool) {
        self.inner.lock().ingest_vehicle_state(mode, armed);
    }

    pub fn ingest_landing_state(&self, code: u8) {
        self.inner.lock().ingest_landing_state(code);
    }

    pub fn ingest_gains(&self, gains: Gains) {
        self.inner.lock().ingest_gains(gains);
    }

    pub fn tick(&self) -> CommandOutput {
        self.inner.lock().tick()
    }

    pub fn telemetry(&self) -> ControllerTelemetry {
        self.inner.lock().telemetry()
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AltitudeController) -> R,
    {
        let mut controller = self.inner.lock();
        f(&mut *controller)
    }
}

// ============================================================================
// CONFIG BUFFER - Live-tunable limits re-read every tick
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimits {
    pub max_vup: f32,
    pub max_vdown: f32,
}

#[derive(Clone)]
pub struct ConfigBuffer {
    data: Arc<Mutex<RateLimits>>,
}

impl ConfigBuffer {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            data: Arc::new(Mutex::new(RateLimits {
                max_vup: config.max_vup,
                max_vdown: config.max_vdown,
            })),
        }
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RateLimits),
    {
        let mut limits = self.data.lock();
        f(&mut *limits);
    }

    pub fn get(&self) -> RateLimits {
        *self.data.lock()
    }
}
