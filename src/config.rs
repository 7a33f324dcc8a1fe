//! Controller configuration, loaded once at startup from TOML.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Gains, TypeMask, FRAME_LOCAL_NED};

/// PID gains section. Required when loading from a file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.01,
        }
    }
}

impl From<PidConfig> for Gains {
    fn from(cfg: PidConfig) -> Self {
        Gains::new(cfg.kp, cfg.ki, cfg.kd)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Altitude target used until the first setpoint arrives [m]
    #[serde(default = "default_altitude_setpoint")]
    pub altitude_setpoint: f32,
    /// Maximum ascent rate [m/s]
    #[serde(default = "default_max_vup")]
    pub max_vup: f32,
    /// Maximum descent rate, positive magnitude [m/s]
    #[serde(default = "default_max_vdown")]
    pub max_vdown: f32,
    /// Sample period fed to the regulator [s]
    #[serde(default = "default_sample_period")]
    pub sample_period: f32,
    #[serde(default = "default_loop_rate_hz")]
    pub loop_rate_hz: f32,
    /// Flight mode in which the integral term may accumulate
    #[serde(default = "default_autonomous_mode")]
    pub autonomous_mode: String,
    #[serde(default = "default_coordinate_frame")]
    pub coordinate_frame: u8,
    #[serde(default = "default_type_mask")]
    pub type_mask: u16,
    /// Position age after which the vertical command is held at zero
    #[serde(default)]
    pub position_timeout_ms: Option<u64>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    pub pid: PidConfig,
}

fn default_altitude_setpoint() -> f32 {
    1.0
}

fn default_max_vup() -> f32 {
    2.0
}

fn default_max_vdown() -> f32 {
    0.5
}

fn default_sample_period() -> f32 {
    0.1
}

fn default_loop_rate_hz() -> f32 {
    20.0
}

fn default_autonomous_mode() -> String {
    "OFFBOARD".to_string()
}

fn default_coordinate_frame() -> u8 {
    FRAME_LOCAL_NED
}

fn default_type_mask() -> u16 {
    TypeMask::VELOCITY_AND_YAW.0
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            altitude_setpoint: default_altitude_setpoint(),
            max_vup: default_max_vup(),
            max_vdown: default_max_vdown(),
            sample_period: default_sample_period(),
            loop_rate_hz: default_loop_rate_hz(),
            autonomous_mode: default_autonomous_mode(),
            coordinate_frame: default_coordinate_frame(),
            type_mask: default_type_mask(),
            position_timeout_ms: None,
            channel_capacity: default_channel_capacity(),
            pid: PidConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_period.is_finite() && self.sample_period > 0.0) {
            return Err(ConfigError::InvalidSamplePeriod(self.sample_period));
        }
        self.loop_period()?;
        for (name, value) in [("max_vup", self.max_vup), ("max_vdown", self.max_vdown)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidRateLimit { name, value });
            }
        }
        for (name, value) in [("kp", self.pid.kp), ("ki", self.pid.ki), ("kd", self.pid.kd)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteGain { name, value });
            }
        }
        if self.position_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn gains(&self) -> Gains {
        self.pid.into()
    }

    pub fn type_mask(&self) -> TypeMask {
        TypeMask(self.type_mask)
    }

    /// Wall-clock period between ticks. Rates whose period is zero or does not
    /// fit in a `Duration` are rejected.
    pub fn loop_period(&self) -> Result<Duration, ConfigError> {
        if !(self.loop_rate_hz.is_finite() && self.loop_rate_hz > 0.0) {
            return Err(ConfigError::InvalidLoopRate(self.loop_rate_hz));
        }
        match Duration::try_from_secs_f32(1.0 / self.loop_rate_hz) {
            Ok(period) if !period.is_zero() => Ok(period),
            _ => Err(ConfigError::InvalidLoopRate(self.loop_rate_hz)),
        }
    }

    /// Number of ticks without a position update before the input counts as stale.
    pub fn position_timeout_ticks(&self) -> Option<u32> {
        self.position_timeout_ms.map(|ms| {
            let ticks = ms as f32 * self.loop_rate_hz / 1000.0;
            ticks.ceil().max(1.0) as u32
        })
    }
}

pub fn parse_config(s: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig = toml::from_str(s)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ControllerConfig, ConfigError> {
    let s = std::fs::read_to_string(path)?;
    parse_config(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.autonomous_mode, "OFFBOARD");
        assert_eq!(config.loop_period().unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn parses_minimal_file_with_defaults() {
        let config = parse_config("[pid]\nkp = 2.0\nki = 0.0\nkd = 0.5\n").unwrap();
        assert_eq!(config.gains(), Gains::new(2.0, 0.0, 0.5));
        assert_eq!(config.max_vup, 2.0);
        assert_eq!(config.max_vdown, 0.5);
        assert_eq!(config.type_mask(), TypeMask::VELOCITY_AND_YAW);
        assert_eq!(config.position_timeout_ms, None);
    }

    #[test]
    fn missing_gains_are_rejected() {
        let result = parse_config("max_vup = 1.0\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn non_positive_sample_period_is_rejected() {
        let result = parse_config("sample_period = 0.0\n[pid]\nkp = 1.0\nki = 0.0\nkd = 0.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidSamplePeriod(_))));

        let config = ControllerConfig {
            sample_period: -0.1,
            ..ControllerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSamplePeriod(_))));
    }

    #[test]
    fn unrepresentable_loop_period_is_rejected() {
        // 1e-39 Hz overflows the period, 1e10 Hz rounds it to zero
        for loop_rate_hz in [1e-39, 1e10, 0.0, f32::NAN] {
            let config = ControllerConfig {
                loop_rate_hz,
                ..ControllerConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidLoopRate(_))));
            assert!(config.loop_period().is_err());
        }

        let result = parse_config("loop_rate_hz = 1e10\n[pid]\nkp = 1.0\nki = 0.0\nkd = 0.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidLoopRate(_))));
    }

    #[test]
    fn negative_rate_limit_is_rejected() {
        let config = ControllerConfig {
            max_vdown: -0.5,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit { name: "max_vdown", .. })
        ));
    }

    #[test]
    fn timeout_converts_to_ticks() {
        let config = ControllerConfig {
            position_timeout_ms: Some(500),
            ..ControllerConfig::default()
        };
        assert_eq!(config.position_timeout_ticks(), Some(10));

        let config = ControllerConfig {
            position_timeout_ms: Some(1),
            ..ControllerConfig::default()
        };
        assert_eq!(config.position_timeout_ticks(), Some(1));
    }
}
