//! Error types for configuration and the control loop runners.

/// Rejected configuration. Raised when a config is loaded or a controller is built,
/// never from inside a control tick.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Sample period must be positive and finite, got {0}")]
    InvalidSamplePeriod(f32),

    #[error("Loop rate must be positive and finite, got {0} Hz")]
    InvalidLoopRate(f32),

    #[error("Rate limit {name} must be non-negative and finite, got {value}")]
    InvalidRateLimit { name: &'static str, value: f32 },

    #[error("Gain {name} must be finite, got {value}")]
    NonFiniteGain { name: &'static str, value: f32 },

    #[error("Position timeout must be positive")]
    InvalidTimeout,
}

/// Reasons a control loop stops on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoopError {
    #[error("Input channel disconnected")]
    InputDisconnected,

    #[error("Command channel disconnected")]
    OutputDisconnected,
}
