// VitalWatch - Samples, Flags, Tiers & Alerts

use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Sensor Data (one synchronised read of IMU + pulse oximeter)
// ---------------------------------------------------------------------------

/// Axes are in the source's native units (see `AccelUnit` / `GyroUnit`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleFrame {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    /// Beats per minute, when the oximeter has a reading.
    pub heart_rate: Option<f32>,
    /// Blood oxygen saturation in %.
    pub spo2: Option<f32>,
    pub timestamp_ms: u32,
}

/// Euclidean norms of one frame, in g and °/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionMagnitude {
    pub accel_g: f32,
    pub gyro_dps: f32,
    /// Largest absolute single-axis rate.
    pub peak_axis_dps: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vitals {
    pub heart_rate: Option<f32>,
    pub spo2: Option<f32>,
}

// ---------------------------------------------------------------------------
// Severity tiers
// ---------------------------------------------------------------------------

/// Mutually exclusive classification, ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    None,
    Sepsis,
    Seizure,
    Critical,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Sepsis => "SEPSIS",
            Self::Seizure => "SEIZURE",
            Self::Critical => "CRITICAL",
        }
    }

    /// Status line shown on the serial console and the OLED.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "NORMAL",
            Self::Sepsis => "SEPSIS INDICATORS",
            Self::Seizure => "SEIZURE DETECTED",
            Self::Critical => "CRITICAL CONDITION",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Matched sub-conditions (presentation only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    // Critical
    ExtremeTachycardia,
    ExtremeBradycardia,
    SevereHypoxemia,
    ViolentMotion,
    ViolentRotation,
    ProlongedSeizureActivity,
    // Seizure
    HighHeartRate,
    LowSpO2,
    ProlongedMotion,
    SustainedTremor,
    // Sepsis
    Tachycardia,
    Bradycardia,
    Hypoxemia,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtremeTachycardia => "Extreme Tachycardia",
            Self::ExtremeBradycardia => "Extreme Bradycardia",
            Self::SevereHypoxemia => "Severe Hypoxemia",
            Self::ViolentMotion => "Violent Motion",
            Self::ViolentRotation => "Violent Rotation",
            Self::ProlongedSeizureActivity => "Prolonged Seizure Activity",
            Self::HighHeartRate => "High HR",
            Self::LowSpO2 => "Low SpO2",
            Self::ProlongedMotion => "Prolonged Motion",
            Self::SustainedTremor => "Sustained Tremor",
            Self::Tachycardia => "Tachycardia",
            Self::Bradycardia => "Bradycardia",
            Self::Hypoxemia => "Hypoxemia",
        }
    }
}

// ---------------------------------------------------------------------------
// Event flags (fall, seizure)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Fall,
    Seizure,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Seizure => "seizure",
        }
    }
}

/// Serialised as the integer the dashboards expect (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FlagLevel {
    #[default]
    Clear,
    Raised,
    Severe,
}

impl FlagLevel {
    pub fn severity(&self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Raised => 1,
            Self::Severe => 2,
        }
    }
}

impl Serialize for FlagLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.severity())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagState {
    pub level: FlagLevel,
    pub raised_at_ms: Option<u32>,
}

impl FlagState {
    pub fn raised(level: FlagLevel, now_ms: u32) -> Self {
        Self {
            level,
            raised_at_ms: Some(now_ms),
        }
    }

    pub fn is_set(&self) -> bool {
        self.level != FlagLevel::Clear
    }
}

// ---------------------------------------------------------------------------
// Alerts handed to the notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Tier classification that passed its cooldown gate.
    Tier {
        tier: Tier,
        conditions: Vec<Condition>,
        message: String,
    },
    /// A flag just reached its confirmed level.
    Event {
        kind: FlagKind,
        level: FlagLevel,
        message: String,
    },
}

impl Alert {
    pub fn message(&self) -> &str {
        match self {
            Self::Tier { message, .. } | Self::Event { message, .. } => message,
        }
    }

    /// Short tag used as the alert "type" by webhook notifiers.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Tier { tier, .. } => tier.as_str(),
            Self::Event { kind: FlagKind::Fall, .. } => "FALL",
            Self::Event { kind: FlagKind::Seizure, .. } => "SEIZURE",
        }
    }
}
