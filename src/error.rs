// VitalWatch - Domain Errors
//
// Typed errors for the detection core.  Application plumbing (firmware
// entry point, drivers, notifiers) stays on `anyhow`.

use thiserror::Error;

/// Rejected configuration.  Raised once at startup by
/// [`MonitorConfig::validate`](crate::config::MonitorConfig::validate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("{low} must be below {high}")]
    Misordered {
        low: &'static str,
        high: &'static str,
    },

    #[error("sample rate must be at least 1 Hz")]
    ZeroSampleRate,

    #[error("sample rate {rate_hz} Hz exceeds the {max_hz} Hz tick limit")]
    SampleRateTooHigh { rate_hz: u32, max_hz: u32 },

    #[error("sensor failure threshold must be at least 1")]
    ZeroFailureThreshold,
}

/// A sensor read that could not be completed this tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    Read(String),

    #[error("sensor not connected")]
    Disconnected,
}

/// A frame that reached the conditioner but cannot be turned into
/// magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("non-finite {axis} sample")]
    NonFinite { axis: &'static str },
}
