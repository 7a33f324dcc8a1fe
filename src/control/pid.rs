//! Single-axis PID regulator with a fixed sample period and a gated integrator.
//!
//! The regulator never reads a clock: the sample period is configuration, so the
//! control law is independent of scheduler jitter. It also never clamps its own
//! output; saturation belongs to the caller, which knows the axis limits.

use crate::error::ConfigError;
use crate::types::Gains;

#[derive(Debug, Clone)]
pub struct PidRegulator {
    // Gains
    kp: f32,
    ki: f32,
    kd: f32,
    sample_period: f32,

    // State
    target: f32,
    integral: f32,
    prev_error: f32,
    last_error: f32,
    last_output: f32,
    integral_enabled: bool,
}

impl PidRegulator {
    pub fn new(gains: Gains, sample_period: f32) -> Result<Self, ConfigError> {
        validate_sample_period(sample_period)?;
        Ok(Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            sample_period,
            target: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            last_error: 0.0,
            last_output: 0.0,
            integral_enabled: false,
        })
    }

    pub fn set_gains(&mut self, gains: Gains) {
        self.kp = gains.kp;
        self.ki = gains.ki;
        self.kd = gains.kd;
    }

    /// Rejects periods that would make the derivative term undefined.
    pub fn set_sample_period(&mut self, sample_period: f32) -> Result<(), ConfigError> {
        validate_sample_period(sample_period)?;
        self.sample_period = sample_period;
        Ok(())
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Disabling freezes the accumulator at its current value; it does not clear it.
    pub fn set_integral_enabled(&mut self, enabled: bool) {
        self.integral_enabled = enabled;
    }

    pub fn advance(&mut self, measurement: f32) -> f32 {
        let error = self.target - measurement;
        self.last_error = error;

        // Proportional term
        let p = self.kp * error;

        // Integral term, accumulated only while the gate is open.
        // An overflowed sum is discarded so the accumulator stays finite.
        if self.integral_enabled {
            let integral = self.integral + error * self.sample_period;
            if integral.is_finite() {
                self.integral = integral;
            }
        }
        let i = self.ki * self.integral;

        // Derivative term, zero when the error change is not representable
        let delta = (error - self.prev_error) / self.sample_period;
        let d = if delta.is_finite() { self.kd * delta } else { 0.0 };

        if error.is_finite() {
            self.prev_error = error;
        }
        self.last_output = p + i + d;
        self.last_output
    }

    /// Clears the accumulator and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_error = 0.0;
        self.last_output = 0.0;
    }

    pub fn gains(&self) -> Gains {
        Gains::new(self.kp, self.ki, self.kd)
    }

    pub fn sample_period(&self) -> f32 {
        self.sample_period
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn integral_enabled(&self) -> bool {
        self.integral_enabled
    }

    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }
}

fn validate_sample_period(sample_period: f32) -> Result<(), ConfigError> {
    if sample_period.is_finite() && sample_period > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSamplePeriod(sample_period))
    }
}
